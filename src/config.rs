//! Runtime, gateway, and batch-sync settings.
//!
//! Every section deserializes with defaults, so a config file only needs the
//! keys it wants to override:
//!
//! ```
//! let cfg: avatar_catalog::config::AppConfig =
//!     serde_json::from_str(r#"{ "sync": { "item_delay_ms": 1000 } }"#).unwrap();
//! assert_eq!(cfg.sync.item_delay_ms, 1000);
//! assert_eq!(cfg.sync.request_timeout_ms, 30_000);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Raw `Cookie` header value carrying the remote session.
    pub auth_cookie: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vrchat.com/api/1".to_string(),
            user_agent: concat!("avatar-catalog/", env!("CARGO_PKG_VERSION")).to_string(),
            auth_cookie: None,
            request_timeout_ms: 30_000,
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Batch run pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pause after every item that made a remote call.
    pub item_delay_ms: u64,
    /// Upper bound on a single remote call.
    pub request_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: 500,
            request_timeout_ms: 30_000,
        }
    }
}

impl SyncConfig {
    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Catalog runtime channel sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub gateway: GatewayConfig,
    pub sync: SyncConfig,
    pub runtime: RuntimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("avatar-catalog.db"),
            gateway: GatewayConfig::default(),
            sync: SyncConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
