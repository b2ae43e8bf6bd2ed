use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::http::gateway::GatewayError;

/// Turn a panicking handler into a 500 in the usual error envelope
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    GatewayError::Internal(anyhow::anyhow!("panic: {}", details)).into_response()
}
