//! Deadline helper shared by the store, the orchestrator and the API.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Run `fut` to completion or fail with [`Error::Timeout`] once `limit` elapses.
///
/// The inner future is dropped on expiry, which cancels any in-flight I/O.
pub async fn within<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::timeout(format!(
            "{} did not finish within {:?}",
            what, limit
        ))),
    }
}
