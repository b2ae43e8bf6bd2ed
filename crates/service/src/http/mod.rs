//! HTTP handlers and routers for the service.

use axum::extract::Request;
use axum::routing::get;
use axum::{Router, ServiceExt};
use http::header::{ACCEPT, ORIGIN, RANGE};
use http::Method;
use tokio::sync::watch;
use tower::Layer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

pub mod config;
pub mod gateway;
pub mod handlers;
pub mod health;
pub mod html;
pub mod serve_content;

pub use config::Config;
pub use handlers::{not_found_handler, panic_response};

use crate::ServiceState;

const STATUS_PREFIX: &str = "/_status";

/// Routes, without the outer path normalisation
pub fn router(config: &Config, state: ServiceState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(config.log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    // Gateway CORS (read only)
    let gateway_cors = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::HEAD])
        .allow_headers(vec![ACCEPT, ORIGIN, RANGE])
        .allow_origin(Any)
        .allow_credentials(false);

    let gateway_routes = Router::new()
        .route("/ipfs", get(gateway::empty_path_handler))
        .route("/ipfs/*path", get(gateway::handler))
        .route("/gw", get(gateway::empty_path_handler))
        .route("/gw/*path", get(gateway::gw_handler))
        .with_state(state.clone())
        .layer(gateway_cors);

    Router::new()
        .merge(gateway_routes)
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .route("/health", get(health::liveness_handler))
        .route("/", get(html::index::handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(trace_layer)
}

/// The full application: trailing slashes are trimmed before routing
pub fn app(config: &Config, state: ServiceState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(config, state))
}

/// Run the gateway HTTP server until `shutdown_rx` fires
pub async fn run(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let app = app(&config, state);

    tracing::info!(addr = ?listen_addr, "Gateway server listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
