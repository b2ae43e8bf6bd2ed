use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Fallback for unmatched routes, in the same envelope the gateway uses
pub async fn not_found_handler(uri: Uri) -> Response {
    let body = serde_json::json!({
        "error": {
            "code": StatusCode::NOT_FOUND.as_u16(),
            "reason": "route_not_found",
            "details": format!("no route for {}", uri.path()),
        }
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
