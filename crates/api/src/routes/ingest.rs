//! Triggered ingestion.

use axum::{extract::State, Json};
use tracing::info;

use crate::response::{ApiError, IngestResponse};
use crate::state::AppState;

/// POST /ingest - Run one fetch, enrich and upsert cycle now.
///
/// Runs independently of the scheduler; a concurrent scheduled run is not
/// suppressed.
pub async fn ingest_handler(State(state): State<AppState>) -> Result<Json<IngestResponse>, ApiError> {
    let report = state
        .ingest_once()
        .await
        .map_err(|e| ApiError::from_error(&e, "ingestion failed"))?;

    info!(run_id = %report.run_id, count = report.count, "Triggered ingestion complete");

    Ok(Json(IngestResponse {
        ingested: report.count,
        run_id: report.run_id,
    }))
}
