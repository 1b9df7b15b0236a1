//! Response bodies and error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ingest_core::{EnrichedRecord, Error, ErrorCategory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppHealth;

/// `GET /healthz` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthzResponse {
    pub status: AppHealth,
}

/// `GET /posts` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostsResponse {
    pub items: Vec<EnrichedRecord>,
    pub limit: i64,
    pub offset: i64,
}

/// `POST /ingest` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub ingested: usize,
    pub run_id: Uuid,
}

/// Error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// API error: status plus JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    /// Map `err` onto a status and code, prefixing the message with `context`.
    pub fn from_error(err: &Error, context: &str) -> Self {
        let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::with_code(status, code_for(err), format!("{}: {}", context, err))
    }
}

/// Stable code for the body; uncoded errors get one per category.
fn code_for(err: &Error) -> &'static str {
    err.error_code().unwrap_or(match err.category() {
        ErrorCategory::Timeout => "TIMEOUT_001",
        ErrorCategory::Config => "CONFIG_001",
        _ => "INTERNAL_001",
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::with_code(status, code_for(&err), err.to_string())
    }
}
