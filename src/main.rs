//! Ingestor
//!
//! Pulls records from an upstream HTTP feed, stamps them with ingestion
//! provenance and upserts them into ClickHouse. Serves:
//! - liveness and component health
//! - reads by owner and by recency
//! - on-demand ingestion runs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use api::{router, AppState};
use clickhouse_client::{ClickHouseClient, ClickHouseConfig, ClickHouseStore};
use ingest_core::SystemClock;
use pipeline::{IngestScheduler, IngestService, SchedulerConfig};
use telemetry::init_tracing_from_env;
use upstream::{HttpSource, SourceConfig};

/// Application configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    #[serde(default)]
    source: SourceConfig,

    #[serde(default)]
    clickhouse: ClickHouseConfig,

    #[serde(default)]
    scheduler: SchedulerConfig,

    /// Run one ingestion before serving
    #[serde(default = "default_startup_ingest")]
    startup_ingest: bool,
    #[serde(default = "default_startup_ingest_timeout_secs")]
    startup_ingest_timeout_secs: u64,

    /// Deadline for GET /posts
    #[serde(default = "default_query_timeout_secs")]
    query_timeout_secs: u64,
    /// Deadline for POST /ingest
    #[serde(default = "default_run_timeout_secs")]
    run_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_startup_ingest() -> bool {
    true
}

fn default_startup_ingest_timeout_secs() -> u64 {
    30
}

fn default_query_timeout_secs() -> u64 {
    5
}

fn default_run_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            source: SourceConfig::default(),
            clickhouse: ClickHouseConfig::default(),
            scheduler: SchedulerConfig::default(),
            startup_ingest: default_startup_ingest(),
            startup_ingest_timeout_secs: default_startup_ingest_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting ingestor v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        source_url = %config.source.url,
        source_name = %config.source.source_name,
        clickhouse_url = %config.clickhouse.url,
        database = %config.clickhouse.database,
        "Loaded config"
    );

    // Store
    let clickhouse = ClickHouseClient::new(config.clickhouse.clone());
    if let Err(e) = clickhouse_client::health::init_schema(&clickhouse).await {
        error!("Failed to initialize ClickHouse schema: {}", e);
        // Continue anyway - schema might already exist
    }
    if clickhouse_client::health::check_connection(&clickhouse).await {
        info!("ClickHouse connection: healthy");
    } else {
        error!("ClickHouse connection: unhealthy");
    }
    let store = Arc::new(ClickHouseStore::from_client(clickhouse).context("Failed to create record store")?);
    if let Err(e) = store.sync_versions().await {
        warn!("Failed to read stored write stamps, using wall clock: {}", e);
    }

    // Source
    let source = Arc::new(HttpSource::new(&config.source).context("Failed to create upstream source")?);

    let service = Arc::new(IngestService::new(
        source,
        store,
        config.source.source_name.clone(),
        Arc::new(SystemClock),
    ));

    if config.startup_ingest {
        let deadline = Duration::from_secs(config.startup_ingest_timeout_secs);
        match service.run_once_within(deadline).await {
            Ok(report) => info!(count = report.count, run_id = %report.run_id, "Startup ingestion complete"),
            Err(e) => warn!("Startup ingestion failed, serving stored data: {}", e),
        }
    }

    let scheduler_handle = IngestScheduler::new(config.scheduler.clone(), service.clone()).start();

    let state = AppState::new(service).with_timeouts(
        Duration::from_secs(config.query_timeout_secs),
        Duration::from_secs(config.run_timeout_secs),
    );
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    if let Some(handle) = scheduler_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. INGESTOR__SOURCE__URL
        .add_source(
            config::Environment::with_prefix("INGESTOR")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    Ok(config)
}

/// Flat variables used by existing deployments. They win over everything else.
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(url) = var("SOURCE_URL") {
        config.source.url = url;
    }
    if let Some(name) = var("SOURCE_NAME") {
        config.source.source_name = name;
    }
    if let Some(raw) = var("HTTP_TIMEOUT") {
        let timeout = parse_timeout(&raw).with_context(|| format!("Invalid HTTP_TIMEOUT {:?}", raw))?;
        config.source = config.source.clone().with_timeout(timeout);
    }
    if let Some(raw) = var("HTTP_LISTEN_ADDR") {
        let (host, port) = parse_listen_addr(&raw).with_context(|| format!("Invalid HTTP_LISTEN_ADDR {:?}", raw))?;
        config.host = host;
        config.port = port;
    }

    if let Some(url) = var("CLICKHOUSE_URL") {
        config.clickhouse.url = url;
    }
    if let Some(database) = var("CLICKHOUSE_DATABASE") {
        config.clickhouse.database = database;
    }
    if let Some(username) = var("CLICKHOUSE_USER") {
        config.clickhouse.username = Some(username);
    }
    if let Some(password) = var("CLICKHOUSE_PASSWORD") {
        config.clickhouse.password = Some(password);
    }

    if let Some(raw) = var("INGEST_INTERVAL_SECS") {
        config.scheduler.interval_secs = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid INGEST_INTERVAL_SECS {:?}", raw))?;
    }

    Ok(())
}

/// `"10"`, `"10s"` or `"500ms"`.
fn parse_timeout(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Some(ms) = raw.strip_suffix("ms") {
        return ms.trim().parse().ok().map(Duration::from_millis);
    }
    let secs = raw.strip_suffix('s').unwrap_or(raw);
    secs.trim().parse().ok().map(Duration::from_secs)
}

/// `":8080"` binds all interfaces; `"127.0.0.1:9000"` binds one.
fn parse_listen_addr(raw: &str) -> Option<(String, u16)> {
    let (host, port) = raw.trim().rsplit_once(':')?;
    let port = port.parse().ok()?;
    let host = if host.is_empty() { default_host() } else { host.to_string() };
    Some((host, port))
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
