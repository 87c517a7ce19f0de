//! `/custom-rule` management handlers.
//!
//! Rules are addressed by `id` or by any `url` on their domain; the rule
//! text travels as the raw request body.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crawlgate_core::{Rule, RuleRef};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RuleQuery {
    id: Option<String>,
    url: Option<String>,
    blocked: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

fn parse_id(id: &str) -> Result<i64, ApiError> {
    id.parse().map_err(|_| ApiError::BadRequest(format!("invalid 'id' query parameter '{id}'")))
}

/// Accepts the usual spellings: `1`, `t`, `true`, `TRUE`, `0`, `f`, `false`...
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn rule_ref(query: &RuleQuery) -> Result<RuleRef, ApiError> {
    if let Some(id) = non_empty(query.id.as_ref()) {
        return Ok(RuleRef::Id(parse_id(id)?));
    }
    match non_empty(query.url.as_ref()) {
        Some(url) => Ok(RuleRef::Url(url.to_string())),
        None => Err(ApiError::BadRequest("'id' or 'url' query parameter is required".into())),
    }
}

fn require_body(body: Bytes) -> Result<String, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("custom rules are not found or empty".into()));
    }
    String::from_utf8(body.to_vec())
        .map_err(|_| ApiError::BadRequest("custom rules must be valid UTF-8 text".into()))
}

pub async fn get_rule(State(state): State<AppState>, Query(query): Query<RuleQuery>) -> Result<Json<Rule>, ApiError> {
    let rule = state.rules.get(&rule_ref(&query)?).await?;
    Ok(Json(rule))
}

pub async fn create_rule(
    State(state): State<AppState>, Query(query): Query<RuleQuery>, body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let url = non_empty(query.url.as_ref())
        .ok_or_else(|| ApiError::BadRequest("'url' query parameter is required".into()))?;
    let blocked = non_empty(query.blocked.as_ref()).and_then(parse_bool).unwrap_or(false);
    let body = require_body(body)?;

    let id = state.rules.create(url, body, blocked).await?;
    Ok(Json(json!({ "id": id })))
}

pub async fn update_rule(
    State(state): State<AppState>, Query(query): Query<RuleQuery>, body: Bytes,
) -> Result<Json<Rule>, ApiError> {
    let rule = rule_ref(&query)?;
    let blocked = non_empty(query.blocked.as_ref())
        .ok_or_else(|| ApiError::BadRequest("'blocked' query parameter is required".into()))?;
    let blocked =
        parse_bool(blocked).ok_or_else(|| ApiError::BadRequest("unable to parse 'blocked' query parameter".into()))?;
    let body = require_body(body)?;

    let updated = state.rules.update(&rule, body, blocked).await?;
    Ok(Json(updated))
}

pub async fn delete_rule(
    State(state): State<AppState>, Query(query): Query<RuleQuery>,
) -> Result<Json<Value>, ApiError> {
    let id = non_empty(query.id.as_ref())
        .ok_or_else(|| ApiError::BadRequest("'id' query parameter is required".into()))?;

    state.rules.delete(parse_id(id)?).await?;
    Ok(Json(json!({ "message": format!("rule with id '{id}' is deleted") })))
}
