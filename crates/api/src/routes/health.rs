//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use telemetry::{health, metrics, HealthReport, MetricsSnapshot};

use crate::response::HealthzResponse;
use crate::state::AppState;

/// Component report plus counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
    pub metrics: MetricsSnapshot,
}

/// GET /healthz - App name, start time and a fixed "ok".
pub async fn healthz_handler(State(state): State<AppState>) -> Json<HealthzResponse> {
    Json(HealthzResponse {
        status: state.health(),
    })
}

/// GET /health - Per-component health.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        report: health().report(),
        metrics: metrics().snapshot(),
    })
}

/// GET /health/ready - ClickHouse reachable.
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
