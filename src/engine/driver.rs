//! Async host for a [`QuizSession`].
//!
//! Player commands and timer events share one channel, so every transition
//! runs to completion before the next event is looked at. Observers follow the
//! session through a `watch` channel and never touch it directly. The driver
//! stops on [`Event::Shutdown`] or once every [`SessionHandle`] is dropped.

use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};

use super::{
    clock::SessionClock,
    session::{Effect, FinalStats, QuizSession, SessionView},
    EngineSettings, QuizMode,
};
use crate::{
    database::quiz::Question,
    reporter::{Report, ReportOutcome},
};

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub enum Command {
    Start {
        mode: QuizMode,
        pool: Arc<[Question]>,
    },
    SelectAnswer(usize),
    Next,
    FiftyFifty,
    SwapQuestion,
    SecondChance,
    Restart,
}

#[derive(Debug)]
pub enum Event {
    Command(Command),
    Tick { generation: u64 },
    AutoAdvance { generation: u64 },
    Shutdown,
}

/// Outcome of reporting one finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session_id: u64,
    pub outcome: ReportOutcome,
}

/// Cloneable handle to a running session driver.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<Event>,
    view: watch::Receiver<SessionView>,
    reports: watch::Receiver<Option<SessionReport>>,
}

impl SessionHandle {
    pub fn spawn<R: Report>(settings: EngineSettings, reporter: R) -> Self {
        Self::spawn_with_rng(settings, reporter, StdRng::from_entropy())
    }

    pub fn spawn_with_rng<R: Report>(settings: EngineSettings, reporter: R, rng: StdRng) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let session = QuizSession::with_rng(settings.question_time, rng);
        let (view_tx, view_rx) = watch::channel(session.view());
        let (reports_tx, reports_rx) = watch::channel(None);

        let driver = Driver {
            clock: SessionClock::new(events_tx.downgrade(), settings.tick),
            session,
            settings,
            view: view_tx,
            reports: Arc::new(reports_tx),
            reporter: Arc::new(reporter),
            reported: None,
        };
        tokio::spawn(driver.run(events_rx));

        Self {
            events: events_tx,
            view: view_rx,
            reports: reports_rx,
        }
    }

    /// Queues a command. Returns `false` once the driver has stopped.
    pub async fn send(&self, command: Command) -> bool {
        self.events.send(Event::Command(command)).await.is_ok()
    }

    pub async fn start(&self, mode: QuizMode, pool: Arc<[Question]>) -> bool {
        self.send(Command::Start { mode, pool }).await
    }

    pub async fn select_answer(&self, option: usize) -> bool {
        self.send(Command::SelectAnswer(option)).await
    }

    pub async fn next(&self) -> bool {
        self.send(Command::Next).await
    }

    pub async fn use_fifty_fifty(&self) -> bool {
        self.send(Command::FiftyFifty).await
    }

    pub async fn use_swap_question(&self) -> bool {
        self.send(Command::SwapQuestion).await
    }

    pub async fn use_second_chance(&self) -> bool {
        self.send(Command::SecondChance).await
    }

    pub async fn restart(&self) -> bool {
        self.send(Command::Restart).await
    }

    /// Stops the driver and every timer it owns.
    pub async fn shutdown(&self) {
        let _ = self.events.send(Event::Shutdown).await;
    }

    pub fn current(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    pub fn reports(&self) -> watch::Receiver<Option<SessionReport>> {
        self.reports.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Whether both handles drive the same session.
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        self.events.same_channel(&other.events)
    }
}

struct Driver<R> {
    session: QuizSession,
    clock: SessionClock,
    settings: EngineSettings,
    view: watch::Sender<SessionView>,
    reports: Arc<watch::Sender<Option<SessionReport>>>,
    reporter: Arc<R>,
    /// Session id whose result has already been handed to the reporter.
    reported: Option<u64>,
}

impl<R: Report> Driver<R> {
    async fn run(mut self, mut events: mpsc::Receiver<Event>) {
        while let Some(event) = events.recv().await {
            let effects = match event {
                Event::Command(command) => self.command(command),
                Event::Tick { generation } => self.session.tick(generation),
                Event::AutoAdvance { generation } => self.session.auto_advance(generation),
                Event::Shutdown => break,
            };
            for effect in effects {
                self.apply(effect);
            }

            let view = self.session.view();
            self.view.send_if_modified(|current| {
                if *current == view {
                    return false;
                }
                *current = view;
                true
            });
            if self.view.is_closed() {
                debug!("No observers left");
                break;
            }
        }

        self.clock.cancel_all();
        debug!(session = self.session.session_id(), "Session driver stopped");
    }

    fn command(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::Start { mode, pool } => self.session.start(mode, pool),
            Command::SelectAnswer(option) => self.session.select_answer(option),
            Command::Next => self.session.next(),
            Command::FiftyFifty => self.session.use_fifty_fifty(),
            Command::SwapQuestion => self.session.use_swap_question(),
            Command::SecondChance => self.session.use_second_chance(),
            Command::Restart => self.session.restart(),
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartClock { generation } => self.clock.start(generation),
            Effect::StopClock => self.clock.stop(),
            Effect::ScheduleAutoAdvance { generation } => self
                .clock
                .schedule_auto_advance(generation, self.settings.auto_advance),
            Effect::CancelAutoAdvance => self.clock.cancel_auto_advance(),
            Effect::Finished(stats) => self.report(stats),
        }
    }

    #[instrument(level = "debug", skip(self))]
    fn report(&mut self, stats: FinalStats) {
        let session_id = self.session.session_id();
        if self.reported == Some(session_id) {
            return;
        }
        self.reported = Some(session_id);
        self.reports.send_replace(None);

        let reporter = Arc::clone(&self.reporter);
        let reports = Arc::clone(&self.reports);
        tokio::spawn(async move {
            let outcome = reporter.report(stats).await;
            info!(
                session = session_id,
                saved = outcome.saved,
                rank = ?outcome.rank,
                "Session result reported"
            );
            reports.send_replace(Some(SessionReport {
                session_id,
                outcome,
            }));
        });
    }
}
