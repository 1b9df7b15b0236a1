//! reqwest-backed record source.

use async_trait::async_trait;
use ingest_core::error::SourceErrorCode;
use ingest_core::{Error, RawRecord, RecordSource, Result};
use reqwest::header::ACCEPT;
use std::time::{Duration, Instant};
use telemetry::health;
use tracing::{debug, warn};
use url::Url;

use crate::config::SourceConfig;

/// Fetches the record array from a single upstream URL.
///
/// The inner client pools connections, so one `HttpSource` should be shared
/// for the lifetime of the process.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpSource {
    /// Creates a source for `config.url` with bounded request and connect timeouts.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let url = Url::parse(&config.url)
            .map_err(|e| Error::config(format!("invalid source url {:?}: {}", config.url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(Duration::from_secs(config.tcp_keepalive_secs))
            .user_agent(concat!("ingestor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        debug!(
            url = %url,
            timeout_ms = config.timeout_ms,
            connect_timeout_ms = config.connect_timeout_ms,
            "Created HTTP source"
        );

        Ok(Self { client, url })
    }

    async fn fetch_inner(&self) -> Result<Vec<RawRecord>> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(
                SourceErrorCode::Status,
                format!("upstream returned {}", status),
            ));
        }

        let body = response.bytes().await.map_err(transport_error)?;

        serde_json::from_slice::<Vec<RawRecord>>(&body).map_err(|e| {
            Error::fetch(
                SourceErrorCode::Decode,
                format!("expected a JSON array of records: {}", e),
            )
        })
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::fetch(SourceErrorCode::Timeout, err.to_string())
    } else {
        Error::fetch(SourceErrorCode::Transport, err.to_string())
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let start = Instant::now();

        match self.fetch_inner().await {
            Ok(records) => {
                health().upstream.set_healthy();
                debug!(
                    url = %self.url,
                    count = records.len(),
                    latency_ms = %start.elapsed().as_millis(),
                    "Fetched upstream records"
                );
                Ok(records)
            }
            Err(e) => {
                health().upstream.set_unhealthy(e.to_string());
                warn!(url = %self.url, error = %e, "Upstream fetch failed");
                Err(e)
            }
        }
    }
}
