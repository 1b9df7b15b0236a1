//! Record store backed by a ReplacingMergeTree table.
//!
//! Upserts append rows with an increasing `version`; reads use `FINAL` so only
//! the newest row per `(owner_key, id)` is ever observed. Reads decode the
//! `doc` column; a row whose document fails to decode is skipped and logged
//! rather than failing the whole query.

use async_trait::async_trait;
use chrono::Utc;
use clickhouse::Row;
use ingest_core::error::DbErrorCode;
use ingest_core::{within, EnrichedRecord, Error, Page, RecordStore, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, error, warn};

use crate::client::ClickHouseClient;
use crate::config::ClickHouseConfig;
use crate::schema::is_valid_table_name;

/// Row layout of the records table.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct RecordRow {
    pub owner_key: i64,
    pub id: i64,
    pub title: String,
    pub body: String,
    pub ingested_at: i64, // DateTime64(6) as microseconds
    pub source: String,
    pub doc: String,
    pub version: u64,
}

impl RecordRow {
    /// Flatten `record` and serialize its document copy.
    pub fn from_record(record: &EnrichedRecord, version: u64) -> Result<Self> {
        Ok(Self {
            owner_key: record.owner_key,
            id: record.id,
            title: record.title.clone(),
            body: record.body.clone(),
            ingested_at: record.ingested_at.timestamp_micros(),
            source: record.source.clone(),
            doc: serde_json::to_string(record)?,
            version,
        })
    }
}

#[derive(Debug, Row, Deserialize)]
struct DocRow {
    doc: String,
}

/// ClickHouse implementation of [`RecordStore`].
pub struct ClickHouseStore {
    client: ClickHouseClient,
    table: String,
    timeout: Duration,
    last_version: AtomicU64,
}

impl ClickHouseStore {
    /// Creates a store from configuration. Does not touch the network.
    pub fn new(config: ClickHouseConfig) -> Result<Self> {
        Self::from_client(ClickHouseClient::new(config))
    }

    /// Wraps an existing client.
    pub fn from_client(client: ClickHouseClient) -> Result<Self> {
        let table = client.config().table.clone();
        if !is_valid_table_name(&table) {
            return Err(Error::config(format!("invalid ClickHouse table name {:?}", table)));
        }

        Ok(Self {
            timeout: client.config().timeout(),
            client,
            table,
            last_version: AtomicU64::new(0),
        })
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Raise the version floor to the highest stamp already in the table.
    ///
    /// Run once after the schema exists. Afterwards every upsert outranks rows
    /// written by earlier processes, even if the wall clock stepped back.
    pub async fn sync_versions(&self) -> Result<u64> {
        let sql = format!("SELECT max(version) FROM {}", self.table);
        let stored = within(self.timeout, "sync_versions", async {
            self.client
                .inner()
                .query(&sql)
                .fetch_one::<u64>()
                .await
                .map_err(read_error)
        })
        .await?;

        self.observe_version(stored);
        debug!(table = %self.table, version = stored, "Synced write stamps");
        Ok(stored)
    }

    fn observe_version(&self, version: u64) {
        self.last_version.fetch_max(version, Ordering::AcqRel);
    }

    /// Reserve `n` consecutive write stamps, strictly above every earlier one.
    ///
    /// Stamps follow wall-clock microseconds when that is ahead of the floor.
    fn reserve_versions(&self, n: u64) -> u64 {
        let now = Utc::now().timestamp_micros().max(0) as u64;
        let mut current = self.last_version.load(Ordering::Acquire);

        loop {
            let start = now.max(current + 1);
            match self.last_version.compare_exchange_weak(
                current,
                start + n - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return start,
                Err(actual) => current = actual,
            }
        }
    }

    async fn write_rows(&self, rows: &[RecordRow]) -> Result<()> {
        // One INSERT: the batch lands as a single block or not at all.
        let mut insert = self.client.inner().insert(&self.table).map_err(write_error)?;

        for row in rows {
            insert.write(row).await.map_err(write_error)?;
        }

        insert.end().await.map_err(write_error)
    }

    async fn fetch_docs(&self, what: &str, query: clickhouse::query::Query) -> Result<Vec<EnrichedRecord>> {
        let start = Instant::now();

        let result = within(self.timeout, what, async {
            query.fetch_all::<DocRow>().await.map_err(read_error)
        })
        .await;

        metrics()
            .query_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        match result {
            Ok(rows) => Ok(decode_docs(rows)),
            Err(e) => {
                metrics().store_read_errors.inc();
                error!(table = %self.table, query = what, error = %e, "ClickHouse read failed");
                Err(e)
            }
        }
    }
}

fn write_error(err: clickhouse::error::Error) -> Error {
    Error::database(DbErrorCode::WriteFailed, format!("Upsert failed: {}", err))
}

fn read_error(err: clickhouse::error::Error) -> Error {
    Error::database(DbErrorCode::ReadFailed, format!("Query failed: {}", err))
}

/// Decode stored documents, dropping any that do not parse.
fn decode_docs(rows: Vec<DocRow>) -> Vec<EnrichedRecord> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_str::<EnrichedRecord>(&row.doc) {
            Ok(record) => Some(record),
            Err(e) => {
                metrics().records_skipped_decode.inc();
                warn!(error = %e, "Skipping stored record with undecodable document");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RecordStore for ClickHouseStore {
    async fn upsert(&self, records: &[EnrichedRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let first_version = self.reserve_versions(records.len() as u64);

        let rows = records
            .iter()
            .zip(first_version..)
            .map(|(record, version)| RecordRow::from_record(record, version))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| Error::database(DbErrorCode::WriteFailed, e.to_string()))?;

        let result = within(self.timeout, "upsert", self.write_rows(&rows)).await;

        let elapsed = start.elapsed();
        metrics().upsert_latency_ms.observe(elapsed.as_millis() as u64);

        match result {
            Ok(()) => {
                debug!(
                    table = %self.table,
                    count = rows.len(),
                    latency_ms = %elapsed.as_millis(),
                    "Upserted records"
                );
                Ok(())
            }
            Err(e) => {
                metrics().store_write_errors.inc();
                error!(table = %self.table, count = rows.len(), error = %e, "ClickHouse upsert failed");
                Err(e)
            }
        }
    }

    async fn query_by_owner(&self, owner_key: i64) -> Result<Vec<EnrichedRecord>> {
        let sql = format!(
            "SELECT doc FROM {} FINAL WHERE owner_key = ? ORDER BY id ASC",
            self.table
        );
        let query = self.client.inner().query(&sql).bind(owner_key);

        self.fetch_docs("query_by_owner", query).await
    }

    async fn query_recent(&self, limit: i64, offset: i64) -> Result<Vec<EnrichedRecord>> {
        let page = Page::clamped(limit, offset);
        let sql = format!(
            "SELECT doc FROM {} FINAL ORDER BY ingested_at DESC, id DESC LIMIT ? OFFSET ?",
            self.table
        );
        let query = self
            .client
            .inner()
            .query(&sql)
            .bind(page.limit)
            .bind(page.offset);

        self.fetch_docs("query_recent", query).await
    }
}
