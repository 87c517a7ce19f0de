//! X-API-Key check for rule management routes.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crawlgate_core::KeyStatus;

use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned);
    let Some(key) = key else {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "X-API-Key header is missing" }))).into_response();
    };

    let status = state.keys.check(&key).await;
    match status {
        Ok(KeyStatus::Active) => next.run(request).await,
        Ok(KeyStatus::Inactive) => {
            tracing::warn!("rejected inactive api key");
            (StatusCode::FORBIDDEN, Json(json!({ "error": "api-key is not active" }))).into_response()
        }
        Ok(KeyStatus::Unknown) => {
            tracing::warn!("rejected unknown api key");
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": "invalid api-key" }))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "api key lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "api-key check failed" }))).into_response()
        }
    }
}
