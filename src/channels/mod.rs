use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::runs::{self, types::SaveRunRequest};
use crate::telemetry::{self};
use crate::telemetry::ops::channels::Phase as ChannelsPhase;

pub mod source;
pub mod types;

pub use source::{ChannelSource, StaticChannelSource};
use types::{ChannelList, ListChannelsRequest, DEFAULT_MAX_CHANNELS};

/// `chandir channels`: fetch a category; plan-only unless --apply saves it as a run.
#[derive(Args, Debug)]
pub struct ChannelsCmd {
    #[arg(long)]
    pub category: String,
    #[arg(long, default_value_t = DEFAULT_MAX_CHANNELS)]
    pub max: usize,
    /// Status label recorded with --apply
    #[arg(long, default_value = runs::types::DEFAULT_STATUS)]
    pub status: String,
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

pub async fn list(source: &dyn ChannelSource, req: ListChannelsRequest) -> Result<ChannelList> {
    let log = telemetry::channels();
    let root = log.root_span_kv([
        ("category", req.category.clone()),
        ("max", req.max_channels.to_string()),
    ]);
    let fetch_span = root.in_scope(|| log.span(&ChannelsPhase::Fetch));
    let channels = source
        .list_channels(&req.category, req.max_channels)
        .instrument(fetch_span)
        .await?;
    log.debug(format!("📡 {} channels for {}", channels.len(), req.category));

    Ok(ChannelList {
        success: true,
        total: channels.len(),
        channels,
        category: req.category,
    })
}

#[derive(Serialize)]
struct ChannelsPlan<'a> {
    action: &'static str,
    category: &'a str,
    channels: usize,
    status: &'a str,
}

pub async fn run(cfg: &AppConfig, args: ChannelsCmd) -> Result<()> {
    let log = telemetry::channels();
    let req = ListChannelsRequest { category: args.category.clone(), max_channels: args.max };
    let listing = list(&StaticChannelSource, req).await?;

    for c in &listing.channels {
        log.info(format!("{} <{}> [{} / {}] subscribers={}", c.name, c.link, c.category, c.subcategory, c.subscribers));
    }

    if !args.apply {
        log.info(format!("📝 {} channels — use --apply to save them as a parsing run.", listing.total));
        if telemetry::config::json_mode() {
            let plan = ChannelsPlan { action: "save", category: &listing.category, channels: listing.total, status: &args.status };
            log.plan(&plan)?;
        }
        return Ok(());
    }

    let _s = log.span(&ChannelsPhase::Save).entered();
    let store = runs::open_store(cfg, &cfg.pool)?.context("DATABASE_URL not configured")?;
    let req = SaveRunRequest {
        category: listing.category,
        channels: listing.channels.into_iter().map(Into::into).collect(),
        status: args.status,
    };
    let saved = runs::save(store.as_ref(), req).await?;
    if telemetry::config::json_mode() {
        log.result(&saved)?;
    }
    Ok(())
}
