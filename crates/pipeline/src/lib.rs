//! Ingestion pipeline.
//!
//! - Enrichment (raw → enriched, pure given a clock)
//! - Service (one fetch → enrich → upsert run, plus read pass-throughs)
//! - Scheduler (periodic runs)

pub mod enrichment;
pub mod scheduler;
pub mod service;

pub use enrichment::enrich;
pub use scheduler::*;
pub use service::*;
