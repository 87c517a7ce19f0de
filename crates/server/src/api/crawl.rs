//! `GET /crawl-allowed`.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crawlgate_client::CrawlDecision;

use crate::error::status_of;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CrawlQuery {
    url: Option<String>,
    user_agent: Option<String>,
}

fn rejected(message: &str) -> (StatusCode, Json<CrawlDecision>) {
    (StatusCode::BAD_REQUEST, Json(CrawlDecision::denied(StatusCode::BAD_REQUEST.as_u16(), message)))
}

/// Answers every outcome in the [`CrawlDecision`] shape, errors included.
pub async fn crawl_allowed(
    State(state): State<AppState>, Query(query): Query<CrawlQuery>,
) -> (StatusCode, Json<CrawlDecision>) {
    let Some(url) = query.url.filter(|url| !url.is_empty()) else {
        return rejected("'url' query parameter is required");
    };
    let Some(user_agent) = query.user_agent.filter(|ua| !ua.is_empty()) else {
        return rejected("'user_agent' query parameter is required");
    };

    match state.resolver.resolve(&url, &user_agent).await {
        Ok(decision) => (StatusCode::OK, Json(decision)),
        Err(e) => {
            let status = status_of(&e);
            if status.is_server_error() {
                tracing::error!(%url, error = %e, "crawl permission check failed");
            }
            (status, Json(CrawlDecision::denied(status.as_u16(), e.to_string())))
        }
    }
}
