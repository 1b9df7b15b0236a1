//! Application state shared across handlers.
//!
//! [`AppState`] is the facade callers see: a liveness summary, a triggered
//! run and the two read paths, each bounded by its own deadline.

use chrono::{DateTime, Utc};
use ingest_core::{within, EnrichedRecord, Result};
use pipeline::{IngestService, RunReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Name reported by `/healthz`.
pub const APP_NAME: &str = "ingestor";

/// Deadline for one read request.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for one triggered ingestion run.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// Liveness summary returned by [`AppState::health`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppHealth {
    pub app: String,
    pub started_at: DateTime<Utc>,
    pub status: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IngestService>,
    pub started_at: DateTime<Utc>,
    pub query_timeout: Duration,
    pub run_timeout: Duration,
}

impl AppState {
    /// Creates state with default deadlines. Start time is taken now.
    pub fn new(service: Arc<IngestService>) -> Self {
        Self {
            service,
            started_at: Utc::now(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            run_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, query_timeout: Duration, run_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self.run_timeout = run_timeout;
        self
    }

    pub fn health(&self) -> AppHealth {
        AppHealth {
            app: APP_NAME.to_string(),
            started_at: self.started_at,
            status: "ok".to_string(),
        }
    }

    pub async fn ingest_once(&self) -> Result<RunReport> {
        self.service.run_once_within(self.run_timeout).await
    }

    pub async fn query_by_user(&self, owner_key: i64) -> Result<Vec<EnrichedRecord>> {
        within(
            self.query_timeout,
            "query_by_user",
            self.service.query_by_owner(owner_key),
        )
        .await
    }

    pub async fn query_recent(&self, limit: i64, offset: i64) -> Result<Vec<EnrichedRecord>> {
        within(
            self.query_timeout,
            "query_recent",
            self.service.query_recent(limit, offset),
        )
        .await
    }
}
