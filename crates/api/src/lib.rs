//! HTTP API layer for the ingestor.

pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
