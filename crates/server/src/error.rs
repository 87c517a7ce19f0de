//! Structured errors for the crawlgate HTTP surface.
//!
//! Core errors map onto status codes by category; request-shape problems
//! detected by the handlers carry their own message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crawlgate_core::Error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed query parameter or body.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => status_of(err),
        }
    }
}

/// HTTP status for a core error.
pub fn status_of(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Upstream(_) | Error::Store(_) | Error::Database(_) | Error::MigrationFailed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(Error::NotFound("x".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(Error::Conflict("x".into())).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(Error::Upstream("x".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::from(Error::Store("x".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_message_keeps_category() {
        let err = ApiError::from(Error::Conflict("rule for domain 'example.com' already exists".into()));
        assert_eq!(err.to_string(), "conflict: rule for domain 'example.com' already exists");
    }
}
