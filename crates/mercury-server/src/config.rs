use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use mercury_store::{LogConfig, SyncMode};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Settings for a Mercury server, normally read from a TOML file.
///
/// Every field has a default, so a config file only needs the keys it
/// changes and a missing file is the same as an empty one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Event log file.
    pub data_path: PathBuf,
    /// fsync after every append.
    pub sync_every_write: bool,
    pub stipend_cooldown_secs: u64,
    /// Default number of events returned by history endpoints.
    pub recent_limit: usize,
    /// Bearer token for admin routes. Without one, admin routes are open.
    pub admin_token: Option<String>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 2009)),
            data_path: PathBuf::from("mercury.log"),
            sync_every_write: true,
            stipend_cooldown_secs: 12 * 60 * 60,
            recent_limit: 50,
            admin_token: None,
            log_filter: "info".into(),
        }
    }
}

impl ServerConfig {
    /// Read `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> ServerResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn from_toml_str(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            sync_mode: if self.sync_every_write {
                SyncMode::EveryWrite
            } else {
                SyncMode::OsDefault
            },
        }
    }

    pub fn stipend_cooldown(&self) -> Duration {
        Duration::from_secs(self.stipend_cooldown_secs)
    }
}
