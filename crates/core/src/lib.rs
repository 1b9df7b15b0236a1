//! Core types, errors, and collaborator traits for the ingestor.

pub mod clock;
pub mod deadline;
pub mod error;
pub mod limits;
pub mod ports;
pub mod records;

pub use clock::*;
pub use deadline::within;
pub use error::{Error, ErrorCategory, Result};
pub use limits::Page;
pub use ports::*;
pub use records::*;
