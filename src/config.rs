use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Anything that can name the database the run store should talk to.
pub trait ConnectionTarget {
    fn database_url(&self) -> Option<&str>;
}

#[derive(Clone, Debug)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_address: String,
    pub pool: PoolSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_address: DEFAULT_BIND.to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.database_url = non_empty(std::env::var("DATABASE_URL").ok());
        if let Ok(bind) = std::env::var("CHANDIR_BIND") {
            cfg.bind_address = bind;
        }
        if let Ok(max) = std::env::var("CHANDIR_DB_MAX_CONNECTIONS") {
            if let Ok(parsed) = max.parse::<u32>() {
                cfg.pool.max_connections = parsed.max(1);
            }
        }
        if let Ok(secs) = std::env::var("CHANDIR_DB_ACQUIRE_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse::<u64>() {
                cfg.pool.acquire_timeout = Duration::from_secs(parsed);
            }
        }
        cfg
    }

    /// CLI flags win over the environment.
    pub fn with_overrides(mut self, dsn: Option<String>, bind: Option<String>) -> Self {
        if let Some(dsn) = non_empty(dsn) {
            self.database_url = Some(dsn);
        }
        if let Some(bind) = bind {
            self.bind_address = bind;
        }
        self
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("invalid bind address: {}", self.bind_address))
    }
}

impl ConnectionTarget for AppConfig {
    fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
