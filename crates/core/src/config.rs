use std::time::Duration;

pub const DEFAULT_TOTAL_ROUNDS: u32 = 10;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(1000);
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(2500);

/// Tunables for one play session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Rounds per game. Clamped to at least one.
    pub total_rounds: u32,
    /// Wait before fetching a question again after a provider failure.
    pub retry_backoff: Duration,
    /// How long feedback stays up, counted from the moment it is shown.
    pub feedback_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
        }
    }
}

impl GameConfig {
    pub fn with_total_rounds(mut self, total_rounds: u32) -> Self {
        self.total_rounds = total_rounds.max(1);
        self
    }
}
