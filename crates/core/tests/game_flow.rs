use bigsmall_core::{
    Choice, GameConfig, GameSession, RoundState, Screen,
    catalog::PairCatalog,
    voice::{PacedPlayback, Phrasebook, SilentAudio, ToneSpeaker, VoiceAudio},
    view::{self, Medal, View},
};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

const ROUNDS: u32 = 4;

fn toned_session(seed: u64) -> GameSession {
    let audio = VoiceAudio::with_phrasebook(
        Arc::new(ToneSpeaker),
        Arc::new(PacedPlayback),
        Phrasebook::seeded(seed),
    );
    GameSession::spawn(
        GameConfig::default().with_total_rounds(ROUNDS),
        Arc::new(PairCatalog::seeded(seed)),
        Arc::new(audio),
    )
}

async fn until(session: &GameSession, pred: impl FnMut(&RoundState) -> bool) -> RoundState {
    let mut rx = session.subscribe();
    let state = rx.wait_for(pred).await.expect("session stopped");
    state.clone()
}

/// Plays a whole game, choosing each slot with `pick`, and returns the final state.
async fn play_through(session: &GameSession, pick: impl Fn(Choice) -> Choice) -> RoundState {
    session.start();
    for round in 1..=ROUNDS {
        let state = until(session, |s| s.round == round && s.accepts_answer()).await;
        let question = state.current_question.expect("playing without a question");
        session.select(pick(question.correct_choice()));
    }
    until(session, |s| s.screen == Screen::GameOver).await
}

#[tokio::test(start_paused = true)]
async fn test_perfect_game_earns_trophy() {
    let session = toned_session(7);
    let started = Instant::now();

    let finished = play_through(&session, |correct| correct).await;
    assert_eq!(finished.score, ROUNDS);
    assert!(started.elapsed() >= GameConfig::default().feedback_delay * ROUNDS);

    let View::GameOver { medal, message, .. } = view::render(&finished) else {
        panic!("expected game over view");
    };
    assert_eq!(medal, Medal::Trophy);
    assert_eq!(message, "哇！你是大小专家！");
}

#[tokio::test(start_paused = true)]
async fn test_all_wrong_game_scores_zero() {
    let session = toned_session(21);
    let finished = play_through(&session, Choice::other).await;
    assert_eq!(finished.score, 0);
    assert_eq!(finished.round, ROUNDS);

    let View::GameOver { medal, .. } = view::render(&finished) else {
        panic!("expected game over view");
    };
    assert_eq!(medal, Medal::Muscle);
}

#[tokio::test(start_paused = true)]
async fn test_instruction_plays_before_answers_count() {
    let session = toned_session(3);
    session.start();

    let busy = until(&session, |s| s.screen == Screen::Playing).await;
    let question = busy.current_question.expect("question");
    if busy.audio_busy {
        // Ignored while the 0.5 s instruction tone is playing.
        session.select(question.correct_choice());
    }

    let ready = until(&session, RoundState::accepts_answer).await;
    assert_eq!(ready.score, 0);
    assert_eq!(ready.round, 1);
}

#[tokio::test(start_paused = true)]
async fn test_silent_game_can_be_restarted() {
    let session = GameSession::spawn(
        GameConfig {
            total_rounds: 2,
            retry_backoff: Duration::from_millis(10),
            feedback_delay: Duration::from_millis(100),
        },
        Arc::new(PairCatalog::seeded(11)),
        Arc::new(SilentAudio),
    );

    for _ in 0..2 {
        session.start();
        for round in 1..=2 {
            let state = until(&session, |s| s.round == round && s.accepts_answer()).await;
            let question = state.current_question.expect("question");
            session.select(question.correct_choice());
        }
        let over = until(&session, |s| s.screen == Screen::GameOver).await;
        assert_eq!(over.score, 2);
    }
    session.shutdown();
}
