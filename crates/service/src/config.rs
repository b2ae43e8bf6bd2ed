use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_LISTEN_PORT: u16 = 1313;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // http server configuration
    /// address for the gateway to listen on.
    ///  if not set then 0.0.0.0:1313 will be used
    pub listen_addr: SocketAddr,

    // data store configuration
    /// a directory of blocks, one file per block named by its CID.
    ///  if not set then an empty in-memory store will be used
    pub repo_path: Option<PathBuf>,
    /// upper bound on the store work a single request may do
    ///  before it is failed as a fetch failure
    pub fetch_timeout_secs: u64,

    // misc
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), DEFAULT_LISTEN_PORT),
            repo_path: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.tracing_level()?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn tracing_level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid log level: {0}")]
    LogLevel(String),
}
