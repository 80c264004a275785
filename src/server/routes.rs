//! Application routing
//!
//! This module defines all HTTP routes for the application.

use axum::{
    http::{header, Method, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{compare, health, models, ui};
use crate::middleware::log_request;
use crate::server::state::AppState;

/// Create the main application router
///
/// Unknown paths and unsupported methods on known paths both answer 404.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index).fallback(not_found))
        .route("/api", post(compare::compare).fallback(not_found))
        .route("/api/models", get(models::list_models).fallback(not_found))
        .route("/health", get(health::health_check).fallback(not_found))
        .fallback(not_found)
        // Layer order: last added = outermost = runs first
        .layer(create_cors_layer())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// CORS for the browser UI. Every OPTIONS request is answered as a preflight.
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}
