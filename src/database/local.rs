use std::{
    sync::{Mutex, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::debug;

use super::{GameResult, Player, ResultStore, StoreResult, MAX_LISTED_RESULTS};
use crate::engine::FinalStats;

/// In-memory leaderboard for players without a remote store.
#[derive(Debug, Default)]
pub struct LocalStore {
    board: Mutex<Board>,
}

/// Results tagged with their insertion order, which breaks ties between
/// games recorded in the same second.
#[derive(Debug, Default)]
struct Board {
    next_seq: u64,
    entries: Vec<(u64, GameResult)>,
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

impl LocalStore {
    fn insert(&self, result: GameResult) -> u32 {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let rank = board
            .entries
            .iter()
            .filter(|(_, r)| r.score > result.score)
            .count() as u32
            + 1;

        let seq = board.next_seq;
        board.next_seq += 1;
        board.entries.push((seq, result));
        // Newest first among equal scores.
        board
            .entries
            .sort_by(|(a_seq, a), (b_seq, b)| b.score.cmp(&a.score).then(b_seq.cmp(a_seq)));
        board.entries.truncate(MAX_LISTED_RESULTS);
        debug!(rank, entries = board.entries.len(), "Stored local result");
        rank
    }

    fn top(&self, limit: usize) -> Vec<GameResult> {
        let board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        board
            .entries
            .iter()
            .take(limit)
            .map(|(_, result)| result.clone())
            .collect()
    }

    fn of_player(&self, player_id: i64, limit: usize) -> Vec<GameResult> {
        let board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let mut history: Vec<&(u64, GameResult)> = board
            .entries
            .iter()
            .filter(|(_, r)| r.player_id == player_id)
            .collect();
        history.sort_by(|(a_seq, a), (b_seq, b)| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then(b_seq.cmp(a_seq))
        });
        history
            .into_iter()
            .take(limit)
            .map(|(_, result)| result.clone())
            .collect()
    }
}

impl ResultStore for LocalStore {
    async fn save_result(&self, player: &Player, stats: &FinalStats) -> StoreResult<u32> {
        Ok(self.insert(GameResult::new(player, stats, unix_now())))
    }

    async fn leaderboard(&self, limit: usize) -> StoreResult<Vec<GameResult>> {
        Ok(self.top(limit.min(MAX_LISTED_RESULTS)))
    }

    async fn history(&self, player_id: i64, limit: usize) -> StoreResult<Vec<GameResult>> {
        Ok(self.of_player(player_id, limit.min(MAX_LISTED_RESULTS)))
    }
}
