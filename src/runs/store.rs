use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Acquire, PgPool};

use crate::config::PoolSettings;

use super::db;
use super::types::{NewRun, ParsingRun, SaveOutcome};

#[async_trait]
pub trait RunStore: Send + Sync {
    /// Writes the run and its channels atomically.
    async fn save_run(&self, run: &NewRun) -> Result<SaveOutcome>;
    /// Newest first, at most `limit` rows.
    async fn recent_runs(&self, limit: i64) -> Result<Vec<ParsingRun>>;
}

#[derive(Clone)]
pub struct PgRunStore {
    pool: PgPool,
}

impl PgRunStore {
    /// Builds the pool without touching the network; connections are opened on first use.
    pub fn connect_lazy(dsn: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_lazy(dsn)
            .context("invalid DATABASE_URL")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl RunStore for PgRunStore {
    async fn save_run(&self, run: &NewRun) -> Result<SaveOutcome> {
        // Pooled connection goes back on drop; an uncommitted tx rolls back.
        let mut conn = self.pool.acquire().await.context("acquire connection")?;
        let mut tx = conn.begin().await?;

        let total = i64::try_from(run.channels.len()).context("too many channels")?;
        let parsing_id = db::insert_run(&mut tx, &run.category, &run.status, total)
            .await
            .context("insert parsing_history")?;

        let mut saved_channels = 0u64;
        for channel in &run.channels {
            saved_channels += db::insert_channel(&mut tx, parsing_id, channel)
                .await
                .with_context(|| format!("insert channel {}", channel.link))?;
        }

        tx.commit().await.context("commit run")?;
        Ok(SaveOutcome { parsing_id, saved_channels })
    }

    async fn recent_runs(&self, limit: i64) -> Result<Vec<ParsingRun>> {
        let mut conn = self.pool.acquire().await.context("acquire connection")?;
        db::recent_runs(&mut conn, limit).await.context("select parsing_history")
    }
}
