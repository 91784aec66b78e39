//! Persistence Sink: best-effort append of score records.
//!
//! `AppState` holds an `Arc<dyn ScoreSink>`. The handler goes through
//! `persist_best_effort`, which logs and swallows every failure.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::check::ScoreRecord;

#[async_trait]
pub trait ScoreSink: Send + Sync {
    async fn append(&self, record: &ScoreRecord) -> Result<(), AppError>;
}

/// Writes to the `resume_checks` table.
pub struct PgScoreSink {
    pool: PgPool,
}

impl PgScoreSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreSink for PgScoreSink {
    async fn append(&self, record: &ScoreRecord) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO resume_checks (ats_score, matched_keywords, suggestions, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(record.ats_score)
        .bind(&record.matched_keywords)
        .bind(&record.suggestions)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Used when no `DATABASE_URL` is configured.
pub struct DisabledSink;

#[async_trait]
impl ScoreSink for DisabledSink {
    async fn append(&self, _record: &ScoreRecord) -> Result<(), AppError> {
        debug!("Persistence disabled; score record not stored");
        Ok(())
    }
}

pub async fn persist_best_effort(sink: &dyn ScoreSink, record: &ScoreRecord) {
    match sink.append(record).await {
        Ok(()) => debug!("Score record appended (ats_score={})", record.ats_score),
        Err(e) => error!("Failed to persist score record: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct FailingSink;

    #[async_trait]
    impl ScoreSink for FailingSink {
        async fn append(&self, _record: &ScoreRecord) -> Result<(), AppError> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn record() -> ScoreRecord {
        ScoreRecord {
            ats_score: 42.0,
            matched_keywords: vec!["rust".to_string()],
            suggestions: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        // Must return normally; nothing to assert beyond not panicking.
        persist_best_effort(&FailingSink, &record()).await;
    }

    #[tokio::test]
    async fn test_disabled_sink_accepts_records() {
        assert!(DisabledSink.append(&record()).await.is_ok());
    }
}
