//! Test fixtures and record generators.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use ingest_core::{EnrichedRecord, RawRecord};

/// Label used by every test service.
pub const SOURCE_NAME: &str = "test_feed";

/// Fixed reference instant, 2025-08-17T04:41:12Z.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 17, 4, 41, 12).unwrap()
}

/// Clock pinned to [`t0`].
pub fn fixed_clock() -> DateTime<FixedOffset> {
    t0().fixed_offset()
}

/// Clock pinned to [`t0`] but reported in UTC+05:30.
pub fn ist_clock() -> DateTime<FixedOffset> {
    let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
    t0().with_timezone(&ist)
}

pub fn raw_record(owner_key: i64, id: i64) -> RawRecord {
    RawRecord {
        owner_key,
        id,
        title: format!("title {}", id),
        body: format!("body of {} by {}", id, owner_key),
    }
}

/// `n` records spread over three owners, ids `1..=n`.
pub fn raw_records(n: i64) -> Vec<RawRecord> {
    (1..=n).map(|id| raw_record(id % 3 + 1, id)).collect()
}

pub fn enriched(owner_key: i64, id: i64, title: &str, ingested_at: DateTime<Utc>) -> EnrichedRecord {
    EnrichedRecord {
        owner_key,
        id,
        title: title.to_string(),
        body: "b".to_string(),
        ingested_at,
        source: SOURCE_NAME.to_string(),
    }
}

/// `t0` shifted by whole seconds.
pub fn t0_plus(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

/// Upstream JSON body for `records`.
pub fn upstream_body(records: &[RawRecord]) -> serde_json::Value {
    serde_json::to_value(records).unwrap()
}
