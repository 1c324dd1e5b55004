use std::borrow::Cow;

use sqlx::{
    postgres::{PgPool, PgRow},
    Row,
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{GameResult, Player, ResultStore, StoreResult, MAX_LISTED_RESULTS};
use crate::engine::{FinalStats, QuizMode};

const RESULT_COLUMNS: &str = "id, player_id, player_name, score, correct_answers, total_questions, \
     percentage, max_streak, mode, EXTRACT(EPOCH FROM created_at)::BIGINT AS recorded_at";

/// Remote result store backed by Postgres.
pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: Cow<'_, str>) -> StoreResult<Self> {
        let pool = PgPool::connect(&connection_string).await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    async fn rank_of(&self, score: u32) -> StoreResult<u32> {
        let rank: i64 =
            sqlx::query_scalar("SELECT COUNT(*)::BIGINT + 1 FROM game_results WHERE score > $1")
                .bind(score as i32)
                .fetch_one(&self.pool)
                .await?;
        Ok(rank as u32)
    }
}

fn game_result(row: &PgRow) -> StoreResult<GameResult> {
    let mode: String = row.try_get("mode")?;
    Ok(GameResult {
        id: row.try_get::<Uuid, _>("id")?,
        player_id: row.try_get("player_id")?,
        player_name: row.try_get("player_name")?,
        score: row.try_get::<i32, _>("score")? as u32,
        correct_count: row.try_get::<i32, _>("correct_answers")? as u32,
        total_questions: row.try_get::<i32, _>("total_questions")? as u32,
        percentage: row.try_get::<i32, _>("percentage")? as u32,
        max_streak: row.try_get::<i32, _>("max_streak")? as u32,
        mode: QuizMode::parse(&mode).ok_or_else(|| format!("unknown quiz mode '{}'", mode))?,
        recorded_at: row.try_get("recorded_at")?,
    })
}

impl ResultStore for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn save_result(&self, player: &Player, stats: &FinalStats) -> StoreResult<u32> {
        let id = Uuid::new_v4();
        debug!(%id, "Saving game result");
        sqlx::query(
            "INSERT INTO game_results (id, player_id, player_name, score, correct_answers, \
             total_questions, percentage, max_streak, mode) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(player.id)
        .bind(player.name.as_str())
        .bind(stats.score as i32)
        .bind(stats.correct_count as i32)
        .bind(stats.total_questions as i32)
        .bind(stats.percentage as i32)
        .bind(stats.max_streak as i32)
        .bind(stats.mode.as_str())
        .execute(&self.pool)
        .await?;

        self.rank_of(stats.score).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn leaderboard(&self, limit: usize) -> StoreResult<Vec<GameResult>> {
        let query = format!(
            "SELECT {} FROM game_results ORDER BY score DESC, created_at DESC LIMIT $1",
            RESULT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(limit.min(MAX_LISTED_RESULTS) as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(game_result).collect()
    }

    #[instrument(level = "debug", skip(self))]
    async fn history(&self, player_id: i64, limit: usize) -> StoreResult<Vec<GameResult>> {
        let query = format!(
            "SELECT {} FROM game_results WHERE player_id = $1 ORDER BY created_at DESC LIMIT $2",
            RESULT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(player_id)
            .bind(limit.min(MAX_LISTED_RESULTS) as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(game_result).collect()
    }
}
