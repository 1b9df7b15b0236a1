//! Internal telemetry for the ingestor.
//!
//! Health and counters live in process-wide registries; the API reads them
//! for the health endpoints.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
