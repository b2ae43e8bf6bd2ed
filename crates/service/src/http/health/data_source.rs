use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use http::request::Parts;

use common::prelude::DagStore;

use crate::ServiceState;

/// Something the gateway needs reachable before it can serve content
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short name reported when the probe fails
    fn name(&self) -> &'static str;

    async fn is_ready(&self) -> Result<(), DataSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("{source_name} is unavailable: {details}")]
    Unavailable {
        source_name: &'static str,
        details: String,
    },
}

/// The block store behind the DAG layer
struct BlockStoreSource {
    dag: Arc<dyn DagStore>,
}

#[async_trait]
impl DataSource for BlockStoreSource {
    fn name(&self) -> &'static str {
        "block store"
    }

    async fn is_ready(&self) -> Result<(), DataSourceError> {
        self.dag
            .ready()
            .await
            .map_err(|e| DataSourceError::Unavailable {
                source_name: self.name(),
                details: e.to_string(),
            })
    }
}

/// Extracts the data sources the readiness probe checks, in order
pub struct ReadinessSources(pub Vec<Arc<dyn DataSource>>);

impl std::fmt::Debug for ReadinessSources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|source| source.name()))
            .finish()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ReadinessSources
where
    ServiceState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ();

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ServiceState::from_ref(state);
        Ok(ReadinessSources(vec![Arc::new(BlockStoreSource {
            dag: state.dag().clone(),
        })]))
    }
}
