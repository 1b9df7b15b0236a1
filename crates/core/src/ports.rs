//! Capability traits for the ingestion collaborators.
//!
//! The orchestrator only sees these traits, so tests can swap in in-memory
//! implementations without network or database access.

use async_trait::async_trait;

use crate::error::Result;
use crate::records::{EnrichedRecord, RawRecord};

/// Pulls a finite batch of raw records from an external provider.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the current collection, in upstream order.
    ///
    /// One outbound request per call; no retries.
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// Durable keyed storage for enriched records.
///
/// Implementations must be safe to share across concurrent runs and queries.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or replace every record by `(owner_key, id)`.
    ///
    /// Either all records are accepted or an error is returned.
    async fn upsert(&self, records: &[EnrichedRecord]) -> Result<()>;

    /// All records of `owner_key`, ascending by `id`.
    async fn query_by_owner(&self, owner_key: i64) -> Result<Vec<EnrichedRecord>>;

    /// A page across owners, newest `ingested_at` first, ties by higher `id`.
    ///
    /// `limit` and `offset` are clamped with [`crate::Page::clamped`].
    async fn query_recent(&self, limit: i64, offset: i64) -> Result<Vec<EnrichedRecord>>;
}
