//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`. Error bodies are `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use customer_vault_core::ShapeError;
use thiserror::Error;

use crate::codec::CodecError;
use crate::peer::PeerError;
use crate::store::StoreError;

/// Application-level error type for the node.
#[derive(Debug, Error)]
pub enum AppError {
    /// Payload has the wrong top-level JSON shape.
    #[error("{0}")]
    Validation(#[from] ShapeError),

    /// Malformed request (missing file, unparsable JSON).
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Uploaded image could not be decoded or re-encoded.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// Filesystem or storage backend failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Peer round trip failed.
    #[error("{0}")]
    Peer(#[from] PeerError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Peer(PeerError::NotConfigured(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Codec(_) | Self::Store(_) | Self::Peer(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Storage, codec and peer causes are reported as-is; only opaque
        // internal failures are hidden.
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Profile not found".to_string());
        assert_eq!(err.to_string(), "Profile not found");

        let err = AppError::Validation(ShapeError::NotAnArray { found: "object" });
        assert_eq!(err.to_string(), "wishlist must be a JSON array, got object");

        let err = AppError::Store(StoreError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.to_string(), "storage error: io error: disk full");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Validation(ShapeError::NotAnObject {
                found: "array"
            })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Codec(CodecError::Empty)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::Io(std::io::Error::other(
                "boom"
            )))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Peer(PeerError::NotConfigured("fetch"))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Peer(PeerError::InvalidUrl("x".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
