//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    #[serde(default)]
    pub patterns: PatternsConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Browser connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Remote debugging endpoint, e.g. `http://localhost:9222`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9222".to_string()
}

/// Interception settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Substring a response URL must contain to be captured.
    #[serde(default = "default_url_filter")]
    pub url_filter: String,

    /// Budget from session start to forced failure.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            url_filter: default_url_filter(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_url_filter() -> String {
    "commits.json".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

/// Pattern overrides. Unset fields use the persisted state, then the
/// built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<String>,
}

/// Where state and logs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            log_dir: default_log_dir(),
        }
    }
}

/// `~/.commitgrab`, or `./.commitgrab` without a home directory.
pub fn commitgrab_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".commitgrab")
}

fn default_state_file() -> PathBuf {
    commitgrab_dir().join("state.json")
}

fn default_log_dir() -> PathBuf {
    commitgrab_dir().join("logs")
}
