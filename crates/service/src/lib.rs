//! HTTP gateway service for content-addressed DAGs.
//!
//! This crate provides everything the `dagway` binary runs:
//! - Configuration (TOML file with CLI overrides applied by the binary)
//! - State management (ServiceState holding the shared DAG store)
//! - HTTP handlers (gateway pipeline, health checks, landing page)
//! - Process lifecycle (tracing setup, graceful shutdown)

pub mod config;
pub mod http;
pub mod process;
pub mod state;

// Re-export key types for convenience
pub use config::{Config, ConfigError};
pub use state::{State as ServiceState, StateSetupError};
