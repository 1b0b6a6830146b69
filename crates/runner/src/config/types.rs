use pumpstream_gateway::{Backoff, ReconcilerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the ingestion process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Feed endpoint
    #[serde(default = "default_ws_uri")]
    pub ws_uri: String,

    #[serde(default = "default_initial_reconnect_delay_ms")]
    pub initial_reconnect_delay_ms: u64,

    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,

    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Reserved for batched writes; every write currently commits on its own
    #[serde(default = "default_write_batch_size")]
    pub write_batch_size: usize,

    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,

    /// Idle sleep of the subscription drain task
    #[serde(default = "default_subscription_idle_ms")]
    pub subscription_idle_ms: u64,

    /// Back-off after a failed subscribe command
    #[serde(default = "default_subscription_retry_ms")]
    pub subscription_retry_ms: u64,
}

fn default_ws_uri() -> String {
    "wss://pumpportal.fun/api/data".to_string()
}

fn default_initial_reconnect_delay_ms() -> u64 {
    1_000
}

fn default_max_reconnect_delay_ms() -> u64 {
    60_000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("token_data.db")
}

fn default_write_batch_size() -> usize {
    50
}

fn default_stats_interval_secs() -> u64 {
    10
}

fn default_subscription_idle_ms() -> u64 {
    100
}

fn default_subscription_retry_ms() -> u64 {
    1_000
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            ws_uri: default_ws_uri(),
            initial_reconnect_delay_ms: default_initial_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            db_path: default_db_path(),
            write_batch_size: default_write_batch_size(),
            stats_interval_secs: default_stats_interval_secs(),
            subscription_idle_ms: default_subscription_idle_ms(),
            subscription_retry_ms: default_subscription_retry_ms(),
        }
    }
}

impl IngestConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.initial_reconnect_delay_ms),
            Duration::from_millis(self.max_reconnect_delay_ms),
        )
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            idle_interval: Duration::from_millis(self.subscription_idle_ms),
            retry_delay: Duration::from_millis(self.subscription_retry_ms),
        }
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }
}
