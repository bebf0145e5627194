//! Health check endpoints
//!
//! - /health - process is up
//! - /health/ready - database reachable, 503 otherwise
//! - /health/live - always OK while the server runs

use crate::{db, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Healthy,
    Unhealthy,
    Ready,
    NotReady,
    Alive,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: Status,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<Status>,
}

impl HealthResponse {
    fn new(status: Status) -> Self {
        Self {
            status,
            version: VERSION,
            database: None,
        }
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::new(Status::Healthy))
}

/// Connection details stay in the log, never in the response body.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match db::health_check(state.db()).await {
        Ok(()) => (Status::Ready, StatusCode::OK, Status::Healthy),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            (Status::NotReady, StatusCode::SERVICE_UNAVAILABLE, Status::Unhealthy)
        }
    };

    let mut response = HealthResponse::new(status);
    response.database = Some(database);
    (code, Json(response))
}

pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse::new(Status::Alive))
}
