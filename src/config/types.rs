use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".gatorconfig.toml";

/// Main configuration structure for gator
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Name of the user commands act on behalf of
    #[serde(
        rename = "current-user-name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_user_name: Option<String>,

    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

/// Settings for the `agg` command
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregatorConfig {
    /// Upper bound on a single feed fetch (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// User-Agent header sent with feed requests
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl AggregatorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("gator/{}", env!("CARGO_PKG_VERSION"))
}
