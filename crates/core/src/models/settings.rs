use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

/// What to do with the pending-operation log after a successful authoritative window fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PendingCleanupPolicy {
    /// Drop every pending entry; the server is the source of truth once reachable.
    #[default]
    ClearAll,
    /// Drop only the entries that replayed successfully; keep the rest for the next read.
    KeepUnsynced,
}

/// Connection details for the remote gateway. The token is opaque to this crate.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub token: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Tuning knobs for reconciliation and balance charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub pending_cleanup: PendingCleanupPolicy,
    /// Number of days covered by the daily balance chart.
    #[serde(default = "default_daily_window")]
    pub daily_window_days: u32,
    /// Number of months covered by the monthly balance chart.
    #[serde(default = "default_monthly_window")]
    pub monthly_window_months: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            pending_cleanup: PendingCleanupPolicy::default(),
            daily_window_days: default_daily_window(),
            monthly_window_months: default_monthly_window(),
        }
    }
}

/// Top-level configuration, stored as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub sync: SyncSettings,

    /// Directory for the durable mirror and pending log. `None` keeps everything in memory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            gateway: GatewayConfig {
                base_url: base_url.into(),
                token: token.into(),
                timeout_secs: default_timeout_secs(),
            },
            sync: SyncSettings::default(),
            data_dir: None,
        }
    }

    /// Check that the configuration can actually be used to build a tracker.
    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.gateway.base_url.trim();
        if url.is_empty() {
            return Err(CoreError::InvalidConfig("base_url must not be empty".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{url}'"
            )));
        }
        if self.gateway.token.trim().is_empty() {
            return Err(CoreError::InvalidConfig("token must not be empty".into()));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(CoreError::InvalidConfig("timeout_secs must be greater than 0".into()));
        }
        if self.sync.daily_window_days == 0 || self.sync.monthly_window_months == 0 {
            return Err(CoreError::InvalidConfig("chart windows must be greater than 0".into()));
        }
        Ok(())
    }

    /// Read settings from a JSON file and validate them.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let bytes = std::fs::read(path)?;
        let settings: Settings = serde_json::from_slice(&bytes)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize settings: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_daily_window() -> u32 {
    30
}

fn default_monthly_window() -> u32 {
    24
}
