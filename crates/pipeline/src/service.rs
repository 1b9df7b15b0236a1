//! Ingestion orchestrator.
//!
//! One run is strictly sequential: fetch, enrich, upsert. A failing step ends
//! the run and nothing after it is attempted. Nothing is retried or queued.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ingest_core::{within, Clock, EnrichedRecord, RecordSource, RecordStore, Result};
use serde::Serialize;
use telemetry::metrics;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::enrichment::enrich;

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Records enriched and written.
    pub count: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Keeps `runs_in_flight` accurate even when a run future is dropped.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        metrics().runs_in_flight.inc();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics().runs_in_flight.dec();
    }
}

/// Coordinates source, enrichment and store.
///
/// Holds no mutable state. Concurrent runs are independent; the store's
/// keyed upsert is what keeps them consistent.
pub struct IngestService {
    source: Arc<dyn RecordSource>,
    store: Arc<dyn RecordStore>,
    source_name: String,
    clock: Arc<dyn Clock>,
}

impl IngestService {
    pub fn new(
        source: Arc<dyn RecordSource>,
        store: Arc<dyn RecordStore>,
        source_name: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            store,
            source_name: source_name.into(),
            clock,
        }
    }

    /// Fetch, enrich and upsert once.
    pub async fn run_once(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("ingest_run", %run_id, source = %self.source_name);

        async move {
            let m = metrics();
            m.runs_started.inc();
            let _in_flight = InFlight::enter();
            let start = Instant::now();

            let result = self.execute().await;

            let elapsed = start.elapsed();
            m.run_latency_ms.observe(elapsed.as_millis() as u64);

            match result {
                Ok(count) => {
                    m.runs_succeeded.inc();
                    info!(count, elapsed_ms = %elapsed.as_millis(), "Ingestion run complete");
                    Ok(RunReport {
                        run_id,
                        count,
                        elapsed,
                    })
                }
                Err(e) => {
                    m.runs_failed.inc();
                    error!(error = %e, code = ?e.error_code(), "Ingestion run failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// [`run_once`](Self::run_once) bounded by `deadline` end to end.
    ///
    /// When the deadline elapses the in-flight step is dropped and a timeout
    /// error is returned. Records already handed to the store may or may not
    /// have been written.
    pub async fn run_once_within(&self, deadline: Duration) -> Result<RunReport> {
        within(deadline, "ingestion run", self.run_once())
            .await
            .inspect_err(|e| {
                if e.category() == ingest_core::ErrorCategory::Timeout {
                    metrics().runs_failed.inc();
                }
            })
    }

    async fn execute(&self) -> Result<usize> {
        let m = metrics();

        let fetch_start = Instant::now();
        let fetched = self.source.fetch().await;
        m.fetch_latency_ms.observe(fetch_start.elapsed().as_millis() as u64);

        let raw = fetched.inspect_err(|_| m.fetch_errors.inc())?;
        m.records_fetched.inc_by(raw.len() as u64);

        let enriched = enrich(&raw, &self.source_name, self.clock.as_ref());

        self.store.upsert(&enriched).await?;
        m.records_upserted.inc_by(enriched.len() as u64);

        Ok(enriched.len())
    }

    /// All records of `owner_key`, ascending by id.
    pub async fn query_by_owner(&self, owner_key: i64) -> Result<Vec<EnrichedRecord>> {
        self.store.query_by_owner(owner_key).await
    }

    /// A page of the most recently ingested records. Out-of-range paging is
    /// clamped by the store.
    pub async fn query_recent(&self, limit: i64, offset: i64) -> Result<Vec<EnrichedRecord>> {
        self.store.query_recent(limit, offset).await
    }
}
