use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use nsrep_store::RetryPolicy;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Versions returned by `/history` when no `limit` is given.
    pub history_limit: usize,
    /// Page length of `/search` when no `length` is given.
    pub search_page_size: usize,
    /// Run an in-memory search store as the secondary store.
    pub secondary: bool,
    /// Store connection attempts after the first one.
    pub connect_attempts: u32,
    pub connect_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            history_limit: 100,
            search_page_size: 10,
            secondary: true,
            connect_attempts: 6,
            connect_delay_ms: 1000,
        }
    }
}

impl ServerConfig {
    /// Read a TOML configuration file. A missing file gives the defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.connect_attempts,
            initial_delay: Duration::from_millis(self.connect_delay_ms),
        }
    }
}
