//! Record types flowing through an ingestion run.
//!
//! Wire names follow the upstream feed (`userId`, camelCase) for the raw form;
//! the enriched form keeps those names and adds `ingested_at` and `source`.
//! The enriched JSON is also the document persisted in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item as delivered by the upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Grouping key of the owning entity.
    #[serde(rename = "userId")]
    pub owner_key: i64,
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// A raw record annotated with ingestion provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(rename = "userId")]
    pub owner_key: i64,
    pub id: i64,
    pub title: String,
    pub body: String,
    pub ingested_at: DateTime<Utc>,
    pub source: String,
}

impl EnrichedRecord {
    /// Builds the enriched form of `raw`. The raw record is left untouched.
    pub fn from_raw(raw: &RawRecord, ingested_at: DateTime<Utc>, source: &str) -> Self {
        Self {
            owner_key: raw.owner_key,
            id: raw.id,
            title: raw.title.clone(),
            body: raw.body.clone(),
            ingested_at,
            source: source.to_string(),
        }
    }

    /// Natural key `(owner_key, id)`.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            owner_key: self.owner_key,
            id: self.id,
        }
    }
}

/// Natural key of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub owner_key: i64,
    pub id: i64,
}
