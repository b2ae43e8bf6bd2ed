use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::serve_content::ServeContentError;

/// Every way a gateway request can fail
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("unsupported node kind: {0}")]
    UnsupportedNodeKind(String),
    #[error("unknown node kind: {0}")]
    UnknownNodeKind(String),
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("content read failed: {0}")]
    ContentReadFailed(String),
    #[error("stream not seekable: {0}")]
    StreamNotSeekable(String),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::PathNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::UnsupportedNodeKind(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnknownNodeKind(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            GatewayError::ContentReadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::StreamNotSeekable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine readable name for the failure
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::InvalidIdentifier(_) => "invalid_identifier",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::PathNotFound(_) => "path_not_found",
            GatewayError::UnsupportedNodeKind(_) => "unsupported_node_kind",
            GatewayError::UnknownNodeKind(_) => "unknown_node_kind",
            GatewayError::FetchFailed(_) => "fetch_failed",
            GatewayError::ContentReadFailed(_) => "content_read_failed",
            GatewayError::StreamNotSeekable(_) => "stream_not_seekable",
            GatewayError::Internal(_) => "internal_error",
        }
    }

    pub fn details(&self) -> String {
        match self {
            GatewayError::InvalidIdentifier(details)
            | GatewayError::NotFound(details)
            | GatewayError::PathNotFound(details)
            | GatewayError::UnsupportedNodeKind(details)
            | GatewayError::UnknownNodeKind(details)
            | GatewayError::FetchFailed(details)
            | GatewayError::ContentReadFailed(details)
            | GatewayError::StreamNotSeekable(details) => details.clone(),
            GatewayError::Internal(e) => format!("{:#}", e),
        }
    }
}

impl From<ServeContentError> for GatewayError {
    fn from(e: ServeContentError) -> Self {
        match e {
            ServeContentError::Seek(e) => GatewayError::StreamNotSeekable(e.to_string()),
            other => GatewayError::Internal(other.into()),
        }
    }
}

impl From<askama::Error> for GatewayError {
    fn from(e: askama::Error) -> Self {
        GatewayError::Internal(anyhow::anyhow!("failed to render template: {}", e))
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u16,
    reason: &'static str,
    details: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(
            status = status.as_u16(),
            reason = self.reason(),
            "gateway request failed: {:?}",
            self
        );

        let body = ErrorEnvelope {
            error: ErrorBody {
                code: status.as_u16(),
                reason: self.reason(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}
