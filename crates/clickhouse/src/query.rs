//! Raw table helpers (used in tests and admin).

use crate::store::ClickHouseStore;
use ingest_core::error::DbErrorCode;
use ingest_core::{Error, Result};

fn read_error(err: clickhouse::error::Error) -> Error {
    Error::database(DbErrorCode::ReadFailed, format!("Query error: {}", err))
}

/// Count distinct keys currently visible in the records table.
pub async fn count_records(store: &ClickHouseStore) -> Result<u64> {
    let sql = format!("SELECT count() FROM {} FINAL", store.table());
    store
        .client()
        .inner()
        .query(&sql)
        .fetch_one::<u64>()
        .await
        .map_err(read_error)
}

/// Insert a row whose `doc` column is arbitrary text, bypassing the store's
/// own stamping.
pub async fn insert_raw_doc(
    store: &ClickHouseStore,
    owner_key: i64,
    id: i64,
    ingested_at_micros: i64,
    doc: &str,
    version: u64,
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (owner_key, id, title, body, ingested_at, source, doc, version) \
         VALUES (?, ?, '', '', fromUnixTimestamp64Micro(toInt64(?), 'UTC'), 'raw', ?, ?)",
        store.table()
    );
    store
        .client()
        .inner()
        .query(&sql)
        .bind(owner_key)
        .bind(id)
        .bind(ingested_at_micros)
        .bind(doc)
        .bind(version)
        .execute()
        .await
        .map_err(|e| Error::database(DbErrorCode::WriteFailed, format!("Insert error: {}", e)))
}
