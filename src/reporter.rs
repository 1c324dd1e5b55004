//! Hands finished sessions to a result store.
//!
//! Players with a remote store get their result saved there. Everyone else
//! plays as a guest and lands on the in-memory leaderboard.

use std::{future::Future, sync::Arc};

use tracing::{info, instrument, warn};

use crate::{
    database::{GameResult, Player, ResultStore, StoreResult},
    engine::FinalStats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOutcome {
    pub saved: bool,
    pub rank: Option<u32>,
    pub is_guest: bool,
}

/// Receives the final stats of a finished session. Never fails; problems
/// show up as an unsaved outcome.
pub trait Report: Send + Sync + 'static {
    fn report(&self, stats: FinalStats) -> impl Future<Output = ReportOutcome> + Send;
}

pub struct ResultReporter<Remote, Local> {
    remote: Option<Arc<Remote>>,
    local: Arc<Local>,
}

impl<Remote: ResultStore, Local: ResultStore> ResultReporter<Remote, Local> {
    pub fn new(remote: Option<Arc<Remote>>, local: Arc<Local>) -> Self {
        Self { remote, local }
    }

    #[instrument(level = "info", skip(self, stats), fields(score = stats.score))]
    pub async fn report(&self, player: &Player, stats: &FinalStats) -> ReportOutcome {
        match &self.remote {
            Some(remote) => match remote.save_result(player, stats).await {
                Ok(rank) => {
                    info!(rank, "Result saved");
                    ReportOutcome {
                        saved: true,
                        rank: Some(rank),
                        is_guest: false,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to save result");
                    ReportOutcome {
                        saved: false,
                        rank: None,
                        is_guest: false,
                    }
                }
            },
            None => match self.local.save_result(player, stats).await {
                Ok(rank) => ReportOutcome {
                    saved: true,
                    rank: Some(rank),
                    is_guest: true,
                },
                Err(e) => {
                    warn!(error = %e, "Failed to keep guest result");
                    ReportOutcome {
                        saved: false,
                        rank: None,
                        is_guest: true,
                    }
                }
            },
        }
    }

    pub async fn leaderboard(&self, limit: usize) -> StoreResult<Vec<GameResult>> {
        match &self.remote {
            Some(remote) => remote.leaderboard(limit).await,
            None => self.local.leaderboard(limit).await,
        }
    }

    pub async fn history(&self, player_id: i64, limit: usize) -> StoreResult<Vec<GameResult>> {
        match &self.remote {
            Some(remote) => remote.history(player_id, limit).await,
            None => self.local.history(player_id, limit).await,
        }
    }

    pub fn for_player(self: &Arc<Self>, player: Player) -> PlayerReporter<Remote, Local> {
        PlayerReporter {
            reporter: Arc::clone(self),
            player,
        }
    }
}

/// A [`ResultReporter`] bound to the player of one session.
pub struct PlayerReporter<Remote, Local> {
    reporter: Arc<ResultReporter<Remote, Local>>,
    player: Player,
}

impl<Remote: ResultStore, Local: ResultStore> Report for PlayerReporter<Remote, Local> {
    fn report(&self, stats: FinalStats) -> impl Future<Output = ReportOutcome> + Send {
        let reporter = Arc::clone(&self.reporter);
        let player = self.player.clone();
        async move { reporter.report(&player, &stats).await }
    }
}
