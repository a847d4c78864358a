//! Health check endpoints
//!
//! Provides Kubernetes-compatible health check endpoints:
//! - /health - Basic health check
//! - /health/ready - Readiness probe (reports session registry state)
//! - /health/live - Liveness probe (always returns OK if server is running)

use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<SessionStats>,
}

/// Session registry snapshot
#[derive(Serialize)]
pub struct SessionStats {
    pub active: usize,
    pub tracked: usize,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: None,
    })
}

/// Readiness probe
///
/// The engine has no external dependencies, so readiness only reports
/// registry occupancy.
pub async fn readiness_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.engine().registry();
    Json(HealthResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: Some(SessionStats {
            active: registry.active_count(Utc::now()),
            tracked: registry.len(),
        }),
    })
}

/// Liveness probe - always returns OK if the server is running
pub async fn liveness_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: None,
    })
}
