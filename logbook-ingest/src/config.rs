use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::datetime::parse_datetime;
use crate::error::{IngestError, IngestResult};
use crate::module::target::GroupingPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Target upload endpoint (`POST`)
    pub upload_url: String,

    /// Telescope statistics endpoint, the telescope name is appended
    pub telescope_stats_url: String,

    pub user: String,

    pub password: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request on transport failure, 1 disables retrying
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    /// Scan start when neither the caller nor the backend supplies one
    #[serde(default = "default_zero_datetime")]
    pub zero_datetime: String,

    /// Scan end when the caller does not supply one
    #[serde(default = "default_inf_datetime")]
    pub inf_datetime: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSection {
    #[serde(default)]
    pub grouping: GroupingPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub backend: BackendConfig,

    #[serde(default)]
    pub range: RangeConfig,

    #[serde(default)]
    pub ingest: IngestSection,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Log files untouched for longer than this are pruned at startup
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_zero_datetime() -> String {
    "1900-01-01T12:00:00".to_string()
}

fn default_inf_datetime() -> String {
    "2100-01-01T12:00:00".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_retention_days() -> u64 {
    3
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            zero_datetime: default_zero_datetime(),
            inf_datetime: default_inf_datetime(),
        }
    }
}

impl BackendConfig {
    pub fn new(upload_url: &str, telescope_stats_url: &str, user: &str, password: &str) -> Self {
        Self {
            upload_url: upload_url.to_string(),
            telescope_stats_url: telescope_stats_url.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RangeConfig {
    pub fn zero(&self) -> IngestResult<NaiveDateTime> {
        parse_datetime(&self.zero_datetime)
    }

    pub fn inf(&self) -> IngestResult<NaiveDateTime> {
        parse_datetime(&self.inf_datetime)
    }
}

impl IngestConfig {
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            backend,
            range: RangeConfig::default(),
            ingest: IngestSection::default(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            log_retention_days: default_log_retention_days(),
        }
    }

    pub fn log_retention(&self) -> Duration {
        Duration::from_secs(self.log_retention_days * 24 * 60 * 60)
    }

    pub fn from_file(path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> IngestResult<Self> {
        let config: IngestConfig = toml::from_str(content)
            .map_err(|e| IngestError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only surface mid-run
    pub fn validate(&self) -> IngestResult<()> {
        self.range.zero()?;
        self.range.inf()?;
        if self.backend.retry_attempts == 0 {
            return Err(IngestError::Config("backend.retry_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}
