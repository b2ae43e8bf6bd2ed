use std::net::SocketAddr;

/// What the HTTP layer needs from the service config
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// level that completed requests are traced at
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, log_level: tracing::Level) -> Self {
        tracing::debug!(%listen_addr, %log_level, "gateway http config");
        Self {
            listen_addr,
            log_level,
        }
    }
}
