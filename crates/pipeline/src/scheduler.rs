//! Periodic ingestion.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::service::IngestService;

fn default_interval_secs() -> u64 {
    300
}

fn default_run_timeout_secs() -> u64 {
    30
}

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between runs. 0 disables periodic ingestion.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upper bound for one scheduled run.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn is_enabled(&self) -> bool {
        self.interval_secs > 0
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Triggers [`IngestService::run_once_within`] on a fixed interval.
///
/// The first scheduled run happens one interval after start. A run that
/// outlasts the interval delays the next tick instead of queueing extra runs.
pub struct IngestScheduler {
    config: SchedulerConfig,
    service: Arc<IngestService>,
}

impl IngestScheduler {
    pub fn new(config: SchedulerConfig, service: Arc<IngestService>) -> Self {
        Self { config, service }
    }

    /// Spawns the loop, or returns `None` when disabled.
    pub fn start(self) -> Option<JoinHandle<()>> {
        if !self.config.is_enabled() {
            info!("Periodic ingestion disabled");
            return None;
        }

        info!(
            interval_secs = self.config.interval_secs,
            run_timeout_secs = self.config.run_timeout_secs,
            "Periodic ingestion started"
        );
        Some(tokio::spawn(self.run()))
    }

    async fn run(self) {
        let period = self.config.interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            // Failures are already logged inside the run span.
            if let Err(e) = self.service.run_once_within(self.config.run_timeout()).await {
                warn!(error = %e, "Scheduled ingestion failed; next attempt at next tick");
            }
        }
    }
}
