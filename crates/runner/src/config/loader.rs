use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

use super::types::IngestConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<IngestConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<IngestConfig, ConfigError> {
    let config: IngestConfig = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<IngestConfig, ConfigError> {
    let default_config = include_str!("default_config.json");
    load_config_from_str(default_config)
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name}={value:?} is not a valid value")))
}

impl IngestConfig {
    /// Apply `PUMPSTREAM_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = lookup("PUMPSTREAM_WS_URI") {
            self.ws_uri = v;
        }
        if let Some(v) = lookup("PUMPSTREAM_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PUMPSTREAM_INITIAL_RECONNECT_DELAY_MS") {
            self.initial_reconnect_delay_ms = parse_var("PUMPSTREAM_INITIAL_RECONNECT_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("PUMPSTREAM_MAX_RECONNECT_DELAY_MS") {
            self.max_reconnect_delay_ms = parse_var("PUMPSTREAM_MAX_RECONNECT_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("PUMPSTREAM_STATS_INTERVAL_SECS") {
            self.stats_interval_secs = parse_var("PUMPSTREAM_STATS_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("PUMPSTREAM_WRITE_BATCH_SIZE") {
            self.write_batch_size = parse_var("PUMPSTREAM_WRITE_BATCH_SIZE", &v)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.ws_uri)
            .map_err(|e| ConfigError::Invalid(format!("ws_uri {:?}: {e}", self.ws_uri)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "ws_uri must use ws or wss, got {:?}",
                url.scheme()
            )));
        }
        if self.initial_reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "initial_reconnect_delay_ms must be positive".into(),
            ));
        }
        if self.max_reconnect_delay_ms < self.initial_reconnect_delay_ms {
            return Err(ConfigError::Invalid(
                "max_reconnect_delay_ms must be at least initial_reconnect_delay_ms".into(),
            ));
        }
        if self.stats_interval_secs == 0 {
            return Err(ConfigError::Invalid("stats_interval_secs must be positive".into()));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("db_path must not be empty".into()));
        }
        Ok(())
    }
}
