use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use quiztrainer::{
    database::{
        bank::{QuestionBank, QuestionPool},
        local::LocalStore,
        quiz::{Question, OPTION_COUNT},
        Player, ResultStore,
    },
    engine::{EngineSettings, FinalStats, Phase, QuizMode, SessionHandle, SessionView},
    reporter::{Report, ReportOutcome, ResultReporter},
};
use rand::{rngs::StdRng, SeedableRng};
use tokio::time;

/// Guest reporter that records into a shared local leaderboard.
struct Guest {
    reporter: Arc<ResultReporter<LocalStore, LocalStore>>,
    player: Player,
}

impl Report for Guest {
    fn report(&self, stats: FinalStats) -> impl Future<Output = ReportOutcome> + Send {
        let reporter = Arc::clone(&self.reporter);
        let player = self.player.clone();
        async move { reporter.report(&player, &stats).await }
    }
}

fn shipped_pool() -> Arc<[Question]> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("questions");
    let bank = QuestionBank::load_dir(&dir, "en").unwrap();
    bank.questions("en").into()
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn correct(view: &SessionView) -> usize {
    view.question.as_ref().unwrap().correct_option()
}

fn spawn(local: &Arc<LocalStore>) -> SessionHandle {
    let reporter = Arc::new(ResultReporter::<LocalStore, _>::new(None, Arc::clone(local)));
    let guest = Guest {
        reporter,
        player: Player {
            id: 1,
            name: "guest".to_owned(),
        },
    };
    SessionHandle::spawn_with_rng(EngineSettings::default(), guest, StdRng::seed_from_u64(11))
}

#[tokio::test(start_paused = true)]
async fn perfect_game_with_every_lifeline() {
    let local = Arc::new(LocalStore::default());
    let handle = spawn(&local);
    let mut reports = handle.reports();

    handle.start(QuizMode::Short, shipped_pool()).await;
    settle().await;
    let view = handle.current();
    assert_eq!(view.phase, Phase::Pending);
    assert_eq!(view.total_questions, 25);

    // Fifty-fifty keeps the correct option and one other.
    handle.use_fifty_fifty().await;
    settle().await;
    let view = handle.current();
    assert_eq!(view.lifelines.hidden_options.len(), 2);
    assert!(!view.lifelines.hidden_options.contains(&correct(&view)));
    handle.select_answer(correct(&view)).await;
    settle().await;
    time::advance(Duration::from_millis(2500)).await;
    settle().await;

    // Swapping replaces the question in place with a fresh countdown.
    let view = handle.current();
    assert_eq!(view.current_index, 1);
    let before = view.question.as_ref().map(Question::id);
    time::advance(Duration::from_secs(3)).await;
    settle().await;
    handle.use_swap_question().await;
    settle().await;
    let view = handle.current();
    assert_eq!(view.current_index, 1);
    assert_ne!(view.question.as_ref().map(Question::id), before);
    assert_eq!(view.time_remaining, 10);
    handle.select_answer(correct(&view)).await;
    settle().await;
    time::advance(Duration::from_millis(2500)).await;
    settle().await;

    // Second chance absorbs one wrong guess.
    handle.use_second_chance().await;
    settle().await;
    let view = handle.current();
    let wrong = (correct(&view) + 1) % OPTION_COUNT;
    handle.select_answer(wrong).await;
    settle().await;
    let view = handle.current();
    assert_eq!(view.phase, Phase::Pending);
    assert_eq!(view.lifelines.second_chance_blocked, Some(wrong));
    handle.select_answer(correct(&view)).await;
    settle().await;
    let view = handle.current();
    assert_eq!(view.phase, Phase::Revealed);
    assert_eq!(view.correct_count, 3);
    assert_eq!(view.score, 450);

    for _ in 3..25 {
        handle.next().await;
        settle().await;
        let view = handle.current();
        assert!(!view.can_use_fifty_fifty());
        handle.select_answer(correct(&view)).await;
        settle().await;
    }
    handle.next().await;
    settle().await;

    let view = handle.current();
    assert_eq!(view.phase, Phase::Finished);
    let stats = view.final_stats();
    assert_eq!(stats.correct_count, 25);
    assert_eq!(stats.incorrect_count, 0);
    assert_eq!(stats.score, 25 * 150);
    assert_eq!(stats.percentage, 100);
    assert_eq!(stats.max_streak, 25);

    let report = reports
        .wait_for(Option::is_some)
        .await
        .unwrap()
        .clone()
        .unwrap();
    assert_eq!(report.session_id, view.session_id);
    assert_eq!(
        report.outcome,
        ReportOutcome {
            saved: true,
            rank: Some(1),
            is_guest: true
        }
    );
    assert_eq!(local.leaderboard(10).await.unwrap()[0].score, 3750);
}

#[tokio::test(start_paused = true)]
async fn unanswered_questions_time_out_and_wait_for_next() {
    let local = Arc::new(LocalStore::default());
    let handle = spawn(&local);
    handle.start(QuizMode::Short, shipped_pool()).await;
    settle().await;

    for _ in 0..10 {
        time::advance(Duration::from_secs(1)).await;
        settle().await;
    }
    let view = handle.current();
    assert_eq!(view.phase, Phase::Revealed);
    assert!(view.timed_out());
    assert_eq!(view.streak, 0);

    time::advance(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(handle.current().current_index, 0);

    handle.next().await;
    settle().await;
    let view = handle.current();
    assert_eq!(view.current_index, 1);
    assert_eq!(view.time_remaining, 10);
}

#[tokio::test(start_paused = true)]
async fn restart_then_start_gives_a_clean_session() {
    let local = Arc::new(LocalStore::default());
    let handle = spawn(&local);
    handle.start(QuizMode::Long, shipped_pool()).await;
    settle().await;
    let first = handle.current();
    assert_eq!(first.total_questions, 50);

    handle.select_answer(correct(&first)).await;
    settle().await;
    handle.restart().await;
    settle().await;
    assert_eq!(handle.current().phase, Phase::Idle);

    // The auto-advance armed before the restart must not fire.
    time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert_eq!(handle.current().phase, Phase::Idle);

    handle.start(QuizMode::Short, shipped_pool()).await;
    settle().await;
    let second = handle.current();
    assert_eq!(second.phase, Phase::Pending);
    assert_eq!(second.session_id, first.session_id + 1);
    assert_eq!(second.score, 0);
    assert_eq!(second.current_index, 0);
    assert!(!second.lifelines.fifty_fifty_used);
    assert!(local.leaderboard(10).await.unwrap().is_empty());
}
