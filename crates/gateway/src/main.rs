//! dagway - read-only HTTP gateway over a content-addressed block store
//!
//! Serves `/ipfs/<cid>[/<path>]` (and the `/gw` alias) out of a directory of
//! blocks. Settings come from an optional TOML file, with flags taking
//! precedence over anything it sets.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use service::Config;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on for HTTP requests
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory of blocks to serve, one file per CID
    #[arg(short, long)]
    repo: Option<PathBuf>,

    /// Seconds a single request may spend fetching from the store
    #[arg(long)]
    fetch_timeout: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            config.listen_addr = SocketAddr::new(config.listen_addr.ip(), port);
        }
        if let Some(repo) = self.repo {
            config.repo_path = Some(repo);
        }
        if let Some(secs) = self.fetch_timeout {
            config.fetch_timeout_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }

        config.tracing_level()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    };

    service::process::spawn_service(&config).await;
}
