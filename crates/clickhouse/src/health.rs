//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use crate::schema::{all_tables, is_valid_identifier, is_valid_table_name};
use ingest_core::error::DbErrorCode;
use ingest_core::{Error, Result};
use telemetry::health;
use tracing::{debug, error};

/// Check ClickHouse connection health and record it in the health registry.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("ClickHouse connection healthy");
            health().clickhouse.set_healthy();
            true
        }
        Err(e) => {
            error!("ClickHouse health check failed: {}", e);
            health().clickhouse.set_unhealthy(format!("Connection failed: {}", e));
            false
        }
    }
}

/// Initialize the database and schema. Safe to run on every start.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let database = &client.config().database;
    let table = &client.config().table;

    if !is_valid_identifier(database) {
        return Err(Error::config(format!("invalid ClickHouse database name {:?}", database)));
    }
    if !is_valid_table_name(table) {
        return Err(Error::config(format!("invalid ClickHouse table name {:?}", table)));
    }

    let server = client.server();
    for ddl in all_tables(database, table) {
        server.query(&ddl).execute().await.map_err(|e| {
            Error::database(DbErrorCode::SchemaFailed, format!("Failed to execute DDL: {}", e))
        })?;
    }

    debug!(database = %database, table = %table, "ClickHouse schema initialized");
    Ok(())
}
