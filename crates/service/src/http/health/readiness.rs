use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::ReadinessSources;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// 200 once every data source answers, 503 naming the first that doesn't
#[tracing::instrument(skip_all)]
pub async fn handler(ReadinessSources(sources): ReadinessSources) -> Response {
    for source in &sources {
        let message = match timeout(PROBE_TIMEOUT, source.is_ready()).await {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("{} did not answer in time", source.name()),
        };

        tracing::warn!("not ready: {}", message);
        let body = serde_json::json!({"status": "failure", "message": message});
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }

    (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
}
