use std::sync::Arc;
use std::time::Duration;

use common::prelude::{Dag, DagStore, FsBlocks, MemoryBlocks};

use super::config::Config;

/// Main service state - shared by every request
#[derive(Clone)]
pub struct State {
    dag: Arc<dyn DagStore>,
    fetch_timeout: Duration,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let dag = match config.repo_path {
            Some(ref path) => {
                // check that the path exists
                if !path.is_dir() {
                    return Err(StateSetupError::RepoPathDoesNotExist(
                        path.display().to_string(),
                    ));
                }
                tracing::info!("Serving blocks from {}", path.display());
                Dag::new(FsBlocks::new(path))
            }
            // otherwise just serve an empty in-memory store
            None => {
                tracing::warn!("No repo path configured, serving an empty in-memory store");
                Dag::new(MemoryBlocks::new())
            }
        };

        Ok(Self::new(Arc::new(dag), config.fetch_timeout()))
    }

    pub fn new(dag: Arc<dyn DagStore>, fetch_timeout: Duration) -> Self {
        Self { dag, fetch_timeout }
    }

    pub fn dag(&self) -> &Arc<dyn DagStore> {
        &self.dag
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Repo path does not exist or is not a directory: {0}")]
    RepoPathDoesNotExist(String),
}
