use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channels::types::ChannelRecord;

pub const DEFAULT_STATUS: &str = "completed";
pub const HISTORY_LIMIT: i64 = 20;

fn default_status() -> String { DEFAULT_STATUS.to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct SaveRunRequest {
    pub category: String,
    pub channels: Vec<ChannelInput>,
    #[serde(default = "default_status")]
    pub status: String,
}

/// A submitted channel; every field may be missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelInput {
    pub name: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub admin: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub subscribers: Option<i64>,
}

impl ChannelInput {
    pub fn into_record(self) -> ChannelRecord {
        ChannelRecord {
            name: self.name.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            admin: self.admin.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            subcategory: self.subcategory.unwrap_or_default(),
            subscribers: self.subscribers.unwrap_or(0),
        }
    }
}

impl From<ChannelRecord> for ChannelInput {
    fn from(c: ChannelRecord) -> Self {
        Self {
            name: Some(c.name),
            link: Some(c.link),
            description: Some(c.description),
            admin: Some(c.admin),
            category: Some(c.category),
            subcategory: Some(c.subcategory),
            subscribers: Some(c.subscribers),
        }
    }
}

/// Validated input for a single store write.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub category: String,
    pub status: String,
    pub channels: Vec<ChannelRecord>,
}

impl From<SaveRunRequest> for NewRun {
    fn from(req: SaveRunRequest) -> Self {
        Self {
            category: req.category,
            status: req.status,
            channels: req.channels.into_iter().map(ChannelInput::into_record).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub parsing_id: i64,
    pub saved_channels: u64,
}

#[derive(Debug, Serialize)]
pub struct SaveRunResponse {
    pub success: bool,
    pub parsing_id: i64,
    pub saved_channels: u64,
    pub total_channels: usize,
}

/// A `parsing_history` row as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ParsingRun {
    pub id: i64,
    pub category: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub total_channels: i64,
    pub success_count: i64,
    pub error_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RunHistory {
    pub success: bool,
    pub history: Vec<ParsingRun>,
}
