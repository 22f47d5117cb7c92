//! Static table of big/small object pairs.
//!
//! Each entry pairs one clearly big thing with one clearly small thing from
//! the same family, so every question built from it has an unambiguous answer.

use crate::{
    error::ProviderError,
    provider::QuestionProvider,
    question::{GameObject, Question, SizeTarget},
};
use async_trait::async_trait;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::VecDeque, sync::Mutex};
use tracing::debug;

/// Pairs most recently asked are skipped while picking the next one.
const RECENT_PAIRS: usize = 3;

#[derive(Debug, Clone, Copy)]
struct Entry {
    name: &'static str,
    glyph: &'static str,
    color: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Pair {
    big: Entry,
    small: Entry,
}

type Row = (&'static str, &'static str, &'static str);

const fn pair(big: Row, small: Row) -> Pair {
    Pair {
        big: Entry {
            name: big.0,
            glyph: big.1,
            color: big.2,
        },
        small: Entry {
            name: small.0,
            glyph: small.1,
            color: small.2,
        },
    }
}

pub const PAIRS: [Pair; 15] = [
    // Animals
    pair(("大象", "🐘", "#B3E5FC"), ("老鼠", "🐭", "#C5CAE9")),
    pair(("鲸鱼", "🐋", "#80DEEA"), ("小鱼", "🐠", "#B39DDB")),
    pair(("长颈鹿", "🦒", "#FFAB91"), ("小鸟", "🐦", "#DCEDC8")),
    pair(("老虎", "🐯", "#FFAB91"), ("小猫", "🐱", "#D7CCC8")),
    // Fruit
    pair(("西瓜", "🍉", "#C8E6C9"), ("草莓", "🍓", "#F8BBD0")),
    pair(("菠萝", "🍍", "#FFF9C4"), ("葡萄", "🍇", "#E1BEE7")),
    pair(("椰子", "🥥", "#FFE0B2"), ("樱桃", "🍒", "#F8BBD0")),
    // Everyday things
    pair(("汽车", "🚗", "#B39DDB"), ("自行车", "🚲", "#FFCC80")),
    pair(("房子", "🏠", "#FFAB91"), ("帐篷", "⛺", "#80DEEA")),
    pair(("书包", "🎒", "#D7CCC8"), ("铅笔", "✏️", "#FFECB3")),
    // Nature
    pair(("大树", "🌳", "#A5D6A7"), ("小花", "🌷", "#F48FB1")),
    pair(("太阳", "☀️", "#FFECB3"), ("星星", "⭐", "#E1BEE7")),
    pair(("大山", "⛰️", "#A1887F"), ("石头", "🪨", "#BCAAA4")),
    // Food
    pair(("披萨", "🍕", "#FFCDD2"), ("糖果", "🍬", "#F8BBD0")),
    pair(("汉堡", "🍔", "#FFE0B2"), ("薯条", "🍟", "#FFF9C4")),
];

impl Pair {
    fn objects(&self) -> (GameObject, GameObject) {
        let big = GameObject::new(self.big.name, self.big.glyph, self.big.color, true);
        let small = GameObject::new(self.small.name, self.small.glyph, self.small.color, false);
        (big, small)
    }
}

/// Builds a question from a pair with a random target and slot order.
pub fn random_question(
    big: GameObject,
    small: GameObject,
    rng: &mut impl Rng,
) -> Result<Question, ProviderError> {
    let target = if rng.random_bool(0.5) {
        SizeTarget::Big
    } else {
        SizeTarget::Small
    };
    let (object1, object2) = if rng.random_bool(0.5) {
        (small, big)
    } else {
        (big, small)
    };
    Ok(Question::new(object1, object2, target)?)
}

struct CatalogState {
    rng: StdRng,
    recent: VecDeque<usize>,
}

/// A `QuestionProvider` backed by [`PAIRS`]. Works offline and never fails.
pub struct PairCatalog {
    pairs: &'static [Pair],
    state: Mutex<CatalogState>,
}

impl PairCatalog {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A catalog whose sequence of questions is reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            pairs: &PAIRS,
            state: Mutex::new(CatalogState {
                rng,
                recent: VecDeque::with_capacity(RECENT_PAIRS),
            }),
        }
    }

    fn history_len(&self) -> usize {
        RECENT_PAIRS.min(self.pairs.len().saturating_sub(1))
    }

    fn next_question(&self) -> Result<Question, ProviderError> {
        let mut state = self.state.lock().map_err(|_| ProviderError::Unavailable)?;
        let CatalogState { rng, recent } = &mut *state;

        let candidates: Vec<usize> = (0..self.pairs.len())
            .filter(|idx| !recent.contains(idx))
            .collect();
        let idx = candidates[rng.random_range(0..candidates.len())];

        recent.push_back(idx);
        while recent.len() > self.history_len() {
            recent.pop_front();
        }

        let (big, small) = self.pairs[idx].objects();
        debug!(pair = idx, big = %big.name, small = %small.name, "Picked pair from catalog");
        random_question(big, small, rng)
    }
}

impl Default for PairCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionProvider for PairCatalog {
    async fn fetch_question(&self) -> Result<Question, ProviderError> {
        self.next_question()
    }
}
