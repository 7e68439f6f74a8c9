use std::time::Duration;

use crate::swapi::DEFAULT_BASE_URL;
use crate::util::env::{db_url, env_opt, env_parse_opt};

/// Everything a sync run needs from the outside world.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: String,
    /// `None`: no deadline on HTTP requests.
    pub http_timeout: Option<Duration>,
    pub database_url: String,
}

impl SyncConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            base_url: env_opt("SWAPI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http_timeout: env_parse_opt::<u64>("SWAPI_HTTP_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            database_url: db_url()?,
        })
    }

    /// Variables worth echoing (redacted) at startup.
    pub const LOGGED_KEYS: &'static [&'static str] = &[
        "SWAPI_BASE_URL",
        "SWAPI_HTTP_TIMEOUT_SECS",
        "DATABASE_URL",
        "DB_HOST",
        "DB_PORT",
        "DB_USERNAME",
        "DB_PASSWORD",
        "DB_DATABASE",
        "DB_CHARSET",
    ];
}
