use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::Instrument;

use crate::config::{AppConfig, ConnectionTarget, PoolSettings};
use crate::telemetry::{self};
use crate::telemetry::ops::runs::Phase as RunsPhase;

mod db;
#[cfg(test)]
pub mod memory;
pub mod store;
pub mod types;

pub use store::{PgRunStore, RunStore};
use types::{NewRun, RunHistory, SaveRunRequest, SaveRunResponse, HISTORY_LIMIT};

/// `chandir history`
#[derive(Args, Debug)]
pub struct HistoryCmd {}

/// `None` when no database is configured; a malformed target is an error.
pub fn open_store(target: &dyn ConnectionTarget, pool: &PoolSettings) -> Result<Option<Arc<dyn RunStore>>> {
    let Some(dsn) = target.database_url() else { return Ok(None) };
    let store = PgRunStore::connect_lazy(dsn, pool)?;
    Ok(Some(Arc::new(store)))
}

pub async fn save(store: &dyn RunStore, req: SaveRunRequest) -> Result<SaveRunResponse> {
    let log = telemetry::runs();
    let root = log.root_span_kv([
        ("category", req.category.clone()),
        ("status", req.status.clone()),
        ("channels", req.channels.len().to_string()),
    ]);

    let run = root.in_scope(|| {
        let _s = log.span(&RunsPhase::Validate).entered();
        NewRun::from(req)
    });
    let total_channels = run.channels.len();

    let save_span = root.in_scope(|| log.span(&RunsPhase::Save));
    let outcome = store.save_run(&run).instrument(save_span).await?;
    root.in_scope(|| log.save_summary(outcome.parsing_id, outcome.saved_channels, total_channels));

    Ok(SaveRunResponse {
        success: true,
        parsing_id: outcome.parsing_id,
        saved_channels: outcome.saved_channels,
        total_channels,
    })
}

pub async fn history(store: &dyn RunStore) -> Result<RunHistory> {
    let log = telemetry::runs();
    let span = log.root_span().in_scope(|| log.span(&RunsPhase::History));
    let history = store.recent_runs(HISTORY_LIMIT).instrument(span).await?;
    log.debug(format!("loaded {} runs", history.len()));
    Ok(RunHistory { success: true, history })
}

pub async fn run(cfg: &AppConfig, _args: HistoryCmd) -> Result<()> {
    let log = telemetry::runs();
    let store = open_store(cfg, &cfg.pool)?.context("DATABASE_URL not configured")?;
    let out = history(store.as_ref()).await?;

    log.info("🗂  Recent runs:");
    for r in &out.history {
        log.info(format!(
            "[{}] {} status={} channels={} ok={} errors={} started={}",
            r.id,
            r.category.as_deref().unwrap_or("-"),
            r.status.as_deref().unwrap_or("-"),
            r.total_channels,
            r.success_count,
            r.error_count,
            r.started_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into()),
        ));
    }
    if telemetry::config::json_mode() {
        log.result(&out)?;
    }
    Ok(())
}
