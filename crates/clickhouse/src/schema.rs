//! ClickHouse table schema.
//!
//! One table keyed by `(owner_key, id)`:
//! - ReplacingMergeTree on `version`, so the latest write of a key wins
//! - structured columns for filtering and ordering
//! - `doc` holds the full enriched record as JSON and is what reads return

/// DDL for the database holding the records table.
pub fn create_database_ddl(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {database}")
}

/// DDL for the records table.
pub fn records_table_ddl(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    -- Natural key
    owner_key Int64,
    id Int64,

    -- Content
    title String,
    body String,

    -- Provenance
    ingested_at DateTime64(6, 'UTC'),
    source LowCardinality(String),

    -- Full serialized record (authoritative read path)
    doc String,

    -- Write stamp; higher replaces lower for the same key
    version UInt64,

    INDEX idx_ingested_at ingested_at TYPE minmax GRANULARITY 1
)
ENGINE = ReplacingMergeTree(version)
ORDER BY (owner_key, id)
SETTINGS index_granularity = 8192
"#
    )
}

/// `table` prefixed with `database` unless it already names one.
pub fn qualified_table(database: &str, table: &str) -> String {
    if table.contains('.') {
        table.to_string()
    } else {
        format!("{database}.{table}")
    }
}

/// All DDL statements, in execution order. The database comes first.
pub fn all_tables(database: &str, table: &str) -> Vec<String> {
    vec![
        create_database_ddl(database),
        records_table_ddl(&qualified_table(database, table)),
    ]
}

/// Whether `name` is a single unquoted identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Whether `name` is a plain or database-qualified identifier.
///
/// Table names are interpolated into SQL, so anything else is rejected.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2 && parts.iter().all(|part| is_valid_identifier(part))
}
