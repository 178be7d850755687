use serde::{Deserialize, Serialize};

/// One directory entry for a messaging channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub name: String,
    pub link: String,
    pub description: String,
    pub admin: String,
    pub category: String,
    pub subcategory: String,
    pub subscribers: i64,
}

pub const DEFAULT_MAX_CHANNELS: usize = 50;

fn default_max_channels() -> usize { DEFAULT_MAX_CHANNELS }

#[derive(Debug, Clone, Deserialize)]
pub struct ListChannelsRequest {
    pub category: String,
    #[serde(default = "default_max_channels")]
    pub max_channels: usize,
}

#[derive(Debug, Serialize)]
pub struct ChannelList {
    pub success: bool,
    pub channels: Vec<ChannelRecord>,
    pub total: usize,
    pub category: String,
}

#[derive(Debug, Serialize)]
pub struct ServiceIdentity {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

impl ServiceIdentity {
    pub fn current() -> Self {
        Self {
            service: "TGStat Parser API",
            version: env!("CARGO_PKG_VERSION"),
            status: "ready",
        }
    }
}
