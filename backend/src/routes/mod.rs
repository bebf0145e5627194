//! Route definitions for the DevConnector API
//!
//! This module organizes all API routes and applies middleware.

use crate::auth::TOKEN_HEADER;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

mod auth;
mod health;
mod posts;
mod profile;
mod users;


pub use auth::auth_routes;
pub use posts::post_routes;
pub use profile::profile_routes;
pub use users::user_routes;

/// Create the main application router with all middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(render_metrics))
        .nest("/api", api_routes(state.clone()))
        // Apply middleware layers
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    HeaderName::from_static(TOKEN_HEADER),
                ]),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes. Each group applies the access guard to its private routes.
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", users::user_routes())
        .nest("/auth", auth::auth_routes(state.clone()))
        .nest("/profile", profile::profile_routes(state.clone()))
        .nest("/posts", posts::post_routes(state))
}

/// Prometheus text exposition, 404 when no recorder is installed
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics() {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Parse a path id. Malformed ids are treated like unknown ones by callers.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
