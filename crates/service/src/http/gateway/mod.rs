//! The gateway pipeline.
//!
//! A request path `<cid>[/<segment>...]` flows through:
//!
//! ```text
//! resolver ──► dispatch ──┬─► directory ──► (index.html) ──┐
//!                         │                                 ▼
//!                         └────────────────────────────► content ──► serve_content
//! ```
//!
//! Every stage returns a [`GatewayError`] on failure, which renders as the
//! JSON error envelope. Store work for one request is bounded by the
//! [`RequestContext`] deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use tokio::time::{timeout_at, Instant};

use common::prelude::DagStore;

use crate::ServiceState;

mod content;
mod directory;
mod dispatch;
mod error;
mod resolver;

pub use error::GatewayError;
pub use resolver::{resolve, Resolved};

/// The `ipfs` namespace accepted under `/gw`
const IPFS_NAMESPACE: &str = "ipfs/";

/// Per-request handle on the store, with the deadline all store work
///  for the request must finish by
#[derive(Clone)]
pub struct RequestContext {
    dag: Arc<dyn DagStore>,
    deadline: Instant,
}

impl RequestContext {
    pub fn new(dag: Arc<dyn DagStore>, fetch_timeout: Duration) -> Self {
        Self {
            dag,
            deadline: Instant::now() + fetch_timeout,
        }
    }

    pub fn dag(&self) -> &dyn DagStore {
        self.dag.as_ref()
    }

    /// Run `fut` unless the request deadline passes first
    pub async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, GatewayError> {
        timeout_at(self.deadline, fut)
            .await
            .map_err(|_| GatewayError::FetchFailed("request deadline exceeded".to_string()))
    }
}

/// What the pipeline needs to know about the inbound request
#[derive(Debug, Clone, Copy)]
pub struct GatewayRequest<'a> {
    pub method: &'a Method,
    pub headers: &'a HeaderMap,
    /// the request's own (percent-encoded) path, used to build listing links
    pub uri_path: &'a str,
}

/// `/ipfs/<cid>[/<path>...]`
#[tracing::instrument(skip(state, headers))]
pub async fn handler(
    State(state): State<ServiceState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<Response, GatewayError> {
    serve_path(&state, &method, &uri, &headers, &path).await
}

/// `/gw/<cid>[/<path>...]`, also accepting `/gw/ipfs/<cid>[/<path>...]`
#[tracing::instrument(skip(state, headers))]
pub async fn gw_handler(
    State(state): State<ServiceState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<Response, GatewayError> {
    let path = path.strip_prefix(IPFS_NAMESPACE).unwrap_or(&path);
    serve_path(&state, &method, &uri, &headers, path).await
}

/// A gateway prefix with nothing after it
pub async fn empty_path_handler() -> GatewayError {
    GatewayError::InvalidIdentifier("no content identifier in path".to_string())
}

async fn serve_path(
    state: &ServiceState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    path: &str,
) -> Result<Response, GatewayError> {
    let ctx = RequestContext::new(state.dag().clone(), state.fetch_timeout());
    let request = GatewayRequest {
        method,
        headers,
        uri_path: uri.path(),
    };

    let resolved = resolve(&ctx, path).await?;
    tracing::debug!(
        root = %resolved.root,
        cid = %resolved.node.cid(),
        kind = ?resolved.node.kind(),
        "resolved gateway path"
    );
    dispatch::dispatch(&ctx, &resolved, request).await
}
