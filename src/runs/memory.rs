use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};

use crate::channels::types::ChannelRecord;

use super::store::RunStore;
use super::types::{NewRun, ParsingRun, SaveOutcome};

/// In-process stand-in for `PgRunStore` with the same (link, run) dedup rule.
#[derive(Default)]
pub struct MemoryRunStore {
    state: Mutex<MemoryState>,
    fail_saves: bool,
}

#[derive(Default)]
struct MemoryState {
    runs: Vec<ParsingRun>,
    channels: Vec<(i64, ChannelRecord)>,
}

impl MemoryRunStore {
    pub fn new() -> Self { Self::default() }

    pub fn failing() -> Self { Self { fail_saves: true, ..Self::default() } }

    pub fn runs(&self) -> Vec<ParsingRun> { self.state.lock().unwrap().runs.clone() }

    pub fn channels_for(&self, parsing_id: i64) -> Vec<ChannelRecord> {
        self.state
            .lock()
            .unwrap()
            .channels
            .iter()
            .filter(|(id, _)| *id == parsing_id)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn save_run(&self, run: &NewRun) -> Result<SaveOutcome> {
        if self.fail_saves {
            bail!("connection refused");
        }
        let mut state = self.state.lock().unwrap();
        let parsing_id = state.runs.len() as i64 + 1;
        // Distinct, increasing timestamps so ordering is deterministic.
        let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(parsing_id);
        let total = run.channels.len() as i64;
        state.runs.push(ParsingRun {
            id: parsing_id,
            category: Some(run.category.clone()),
            started_at: Some(at),
            completed_at: Some(at),
            status: Some(run.status.clone()),
            total_channels: total,
            success_count: total,
            error_count: 0,
        });

        let mut seen = HashSet::new();
        let mut saved_channels = 0;
        for c in &run.channels {
            if seen.insert(c.link.clone()) {
                state.channels.push((parsing_id, c.clone()));
                saved_channels += 1;
            }
        }
        Ok(SaveOutcome { parsing_id, saved_channels })
    }

    async fn recent_runs(&self, limit: i64) -> Result<Vec<ParsingRun>> {
        if self.fail_saves {
            bail!("connection refused");
        }
        let state = self.state.lock().unwrap();
        Ok(state.runs.iter().rev().take(limit.max(0) as usize).cloned().collect())
    }
}
