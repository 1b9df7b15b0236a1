//! Read endpoint.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use ingest_core::error::ValidationErrorCode;
use ingest_core::limits::DEFAULT_PAGE_LIMIT;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::response::{ApiError, PostsResponse};
use crate::state::AppState;

/// Raw query string; every field is parsed by hand so bad paging values can
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Parse `value` as an integer, or `default` when absent or malformed.
pub fn parse_int(value: Option<&str>, default: i64) -> i64 {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// GET /posts - Records of one owner (`userId`), or the most recent page.
///
/// `limit`/`offset` are echoed as parsed; clamping happens in the store.
pub async fn posts_handler(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<PostsResponse>, ApiError> {
    let limit = parse_int(query.limit.as_deref(), DEFAULT_PAGE_LIMIT as i64);
    let offset = parse_int(query.offset.as_deref(), 0);

    let result = match query.user_id.as_deref().filter(|v| !v.is_empty()) {
        None => state.query_recent(limit, offset).await,
        Some(raw) => {
            let owner_key: i64 = raw.parse().map_err(|_| {
                ApiError::with_code(
                    StatusCode::BAD_REQUEST,
                    ValidationErrorCode::InvalidOwnerKey.code(),
                    "invalid userId",
                )
            })?;
            state.query_by_user(owner_key).await
        }
    };

    let items = result.map_err(|e| {
        warn!(error = %e, "Posts query failed");
        ApiError::from_error(&e, "query error")
    })?;

    debug!(count = items.len(), limit, offset, "Served posts");

    Ok(Json(PostsResponse {
        items,
        limit,
        offset,
    }))
}
