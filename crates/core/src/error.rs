//! Unified error types for the ingestor.
//!
//! Error codes:
//! - SRC_001-004: Upstream fetch errors
//! - DB_001-003: Record store errors
//! - VALID_001: Caller input errors

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Upstream fetch error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorCode {
    /// SRC_001: Transport failure (connect, TLS, reset)
    Transport,
    /// SRC_002: Upstream answered outside 200-299
    Status,
    /// SRC_003: Body is not a JSON array of records
    Decode,
    /// SRC_004: Request exceeded its timeout
    Timeout,
}

impl SourceErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "SRC_001",
            Self::Status => "SRC_002",
            Self::Decode => "SRC_003",
            Self::Timeout => "SRC_004",
        }
    }
}

/// Record store error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Failed to upsert records
    WriteFailed,
    /// DB_002: Failed to query records
    ReadFailed,
    /// DB_003: Failed to create the database or table
    SchemaFailed,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::WriteFailed => "DB_001",
            Self::ReadFailed => "DB_002",
            Self::SchemaFailed => "DB_003",
        }
    }
}

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Owner key is not an integer
    InvalidOwnerKey,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidOwnerKey => "VALID_001",
        }
    }
}

/// Coarse failure taxonomy used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Fetch,
    StoreWrite,
    StoreRead,
    StoreSchema,
    Validation,
    Timeout,
    Config,
    Internal,
}

/// Unified error type for the ingestor.
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream fetch error with code.
    #[error("[{code}] fetch failed: {message}")]
    Fetch { code: &'static str, message: String },

    /// Store error with code.
    #[error("[{code}] {message}")]
    Database { code: &'static str, message: String },

    /// Caller input error with code.
    #[error("[{code}] {message}")]
    Validation { code: &'static str, message: String },

    #[error("deadline exceeded: {0}")]
    Timeout(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an upstream fetch error.
    pub fn fetch(code: SourceErrorCode, msg: impl Into<String>) -> Self {
        Self::Fetch {
            code: code.code(),
            message: msg.into(),
        }
    }

    /// Create a store error.
    pub fn database(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Database {
            code: code.code(),
            message: msg.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch { .. } => ErrorCategory::Fetch,
            Self::Database { code, .. } if *code == DbErrorCode::WriteFailed.code() => {
                ErrorCategory::StoreWrite
            }
            Self::Database { code, .. } if *code == DbErrorCode::SchemaFailed.code() => {
                ErrorCategory::StoreSchema
            }
            Self::Database { .. } => ErrorCategory::StoreRead,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Config(_) => ErrorCategory::Config,
            Self::Serialization(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::Timeout => 504,
            _ => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Fetch { code, .. } => Some(code),
            Self::Database { code, .. } => Some(code),
            Self::Validation { code, .. } => Some(code),
            _ => None,
        }
    }
}
