//! Raw → enriched record transformation.
//!
//! Pure apart from one reading of the injected clock per call: every record
//! produced by one call shares the same `ingested_at`.

use chrono::Utc;
use ingest_core::{Clock, EnrichedRecord, RawRecord};

/// Annotate `raw` with `source` and the current instant in UTC.
///
/// Output order and length match the input. The input slice is only borrowed.
pub fn enrich(raw: &[RawRecord], source: &str, clock: &dyn Clock) -> Vec<EnrichedRecord> {
    if raw.is_empty() {
        return Vec::new();
    }

    let ingested_at = clock.now().with_timezone(&Utc);

    raw.iter()
        .map(|record| EnrichedRecord::from_raw(record, ingested_at, source))
        .collect()
}
