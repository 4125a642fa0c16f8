//! GET /api/health

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::middleware::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Reports `ok`, or `degraded` when the database does not answer
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = match state.pool.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!("Health check: database ping failed: {:#}", e);
            "degraded"
        }
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    })
}
