use super::types::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const CHAT_UNAVAILABLE: &str =
    "An internal error occurred while trying to connect to the Gemini API.";
pub const STREAM_UNAVAILABLE: &str =
    "An internal error occurred while streaming from the Gemini API.";
pub const RECOGNIZE_FAILED: &str = "Failed to process the image.";

/// Failures at the HTTP boundary, each with a fixed response shape.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method Not Allowed. Please use POST.")]
    MethodNotAllowed,

    #[error("{0}")]
    BadRequest(String),

    #[error("API key is not configured on the server.")]
    ServerMisconfigured,

    #[error("{0}")]
    UpstreamUnavailable(&'static str),

    /// Relayed as-is so callers can inspect provider detail such as safety
    /// blocks or quota errors.
    #[error("Upstream rejected the request with status {status}")]
    UpstreamRejected {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl RelayError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ServerMisconfigured | Self::UpstreamUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::UpstreamRejected { status, .. } => *status,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::UpstreamRejected { body, .. } => (status, Json(body)).into_response(),
            other => (
                status,
                Json(ErrorResponse {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
