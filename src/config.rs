//! Application configuration.
//!
//! Loaded from a JSON file; every field has a serde default so a partial (or
//! missing) file still yields a working configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Backend collaborator endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL for the authentication collaborator and the push channel.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout for gateway calls, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://portal.vantage.internal".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty backend config")
    }
}

/// Session/view coordination tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path the OAuth provider redirects back to.
    #[serde(default = "default_oauth_return_path")]
    pub oauth_return_path: String,

    /// Substring marking an administrative account email. Used only by the
    /// watchdog fallback; weaker than role-based classification by design.
    #[serde(default = "default_admin_email_marker")]
    pub admin_email_marker: String,

    /// How long the callback screen may stay up before the watchdog forces
    /// a terminal decision, in milliseconds.
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_ms: u64,

    /// Poll interval for the reactive facts accessor, in milliseconds.
    #[serde(default = "default_facts_poll_interval")]
    pub facts_poll_interval_ms: u64,
}

fn default_oauth_return_path() -> String {
    "/auth/callback".to_string()
}

fn default_admin_email_marker() -> String {
    "admin".to_string()
}

fn default_callback_timeout() -> u64 {
    3_000
}

fn default_facts_poll_interval() -> u64 {
    2_000
}

impl SessionConfig {
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_millis(self.callback_timeout_ms)
    }

    pub fn facts_poll_interval(&self) -> Duration {
        Duration::from_millis(self.facts_poll_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty session config")
    }
}

/// Notification queue tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Maximum entries shown at once; pushing past the cap drops the oldest.
    #[serde(default = "default_cap")]
    pub cap: usize,

    /// TTL for connectivity-style ephemeral notices, in milliseconds.
    #[serde(default = "default_connectivity_ttl")]
    pub connectivity_ttl_ms: u64,

    /// TTL for content notifications (inserts/updates), in milliseconds.
    #[serde(default = "default_content_ttl")]
    pub content_ttl_ms: u64,

    /// TTL for alerts, in milliseconds.
    #[serde(default = "default_alert_ttl")]
    pub alert_ttl_ms: u64,
}

fn default_cap() -> usize {
    5
}

fn default_connectivity_ttl() -> u64 {
    5_000
}

fn default_content_ttl() -> u64 {
    8_000
}

fn default_alert_ttl() -> u64 {
    10_000
}

impl NotificationConfig {
    pub fn connectivity_ttl(&self) -> Duration {
        Duration::from_millis(self.connectivity_ttl_ms)
    }

    pub fn content_ttl(&self) -> Duration {
        Duration::from_millis(self.content_ttl_ms)
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_millis(self.alert_ttl_ms)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty notification config")
    }
}

impl Config {
    /// Load from a JSON file. A missing file yields the defaults; a present
    /// but malformed file is an error (silent fallback would hide typos).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
