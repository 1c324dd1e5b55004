use std::{error::Error, future::Future};

use uuid::Uuid;

use crate::engine::{FinalStats, QuizMode};

pub mod bank;
pub mod connection;
pub mod import;
pub mod local;
pub mod quiz;

pub type StoreResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Most entries any leaderboard or history listing returns.
pub const MAX_LISTED_RESULTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Player {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub id: Uuid,
    pub player_id: i64,
    pub player_name: String,
    pub score: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub max_streak: u32,
    pub mode: QuizMode,
    /// Unix seconds.
    pub recorded_at: i64,
}

impl GameResult {
    pub fn new(player: &Player, stats: &FinalStats, recorded_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id: player.id,
            player_name: player.name.clone(),
            score: stats.score,
            correct_count: stats.correct_count,
            total_questions: stats.total_questions,
            percentage: stats.percentage,
            max_streak: stats.max_streak,
            mode: stats.mode,
            recorded_at,
        }
    }
}

/// Where finished sessions end up.
pub trait ResultStore: Send + Sync + 'static {
    /// Persists a result and returns its leaderboard rank.
    fn save_result(
        &self,
        player: &Player,
        stats: &FinalStats,
    ) -> impl Future<Output = StoreResult<u32>> + Send;

    fn leaderboard(&self, limit: usize) -> impl Future<Output = StoreResult<Vec<GameResult>>> + Send;

    fn history(
        &self,
        player_id: i64,
        limit: usize,
    ) -> impl Future<Output = StoreResult<Vec<GameResult>>> + Send;
}
