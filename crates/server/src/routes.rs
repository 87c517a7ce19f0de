use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crawlgate_core::AppConfig;

use crate::api;
use crate::auth::require_api_key;
use crate::state::AppState;

pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let mut rule_routes = Router::new().route(
        "/custom-rule",
        get(api::get_rule).post(api::create_rule).put(api::update_rule).delete(api::delete_rule),
    );
    if config.auth.enabled {
        rule_routes = rule_routes.route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));
    }

    let api_routes = Router::new().route("/crawl-allowed", get(api::crawl_allowed)).merge(rule_routes);
    let api_routes = match config.server.api_path.as_str() {
        "/" => api_routes,
        path => Router::new().nest(path, api_routes),
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(config.server.cors_max_age());

    Router::new()
        .route("/ping", get(ping))
        .merge(api_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false)),
        )
        .with_state(state)
}

async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": format!("no route found for {method} {uri}") })))
}
