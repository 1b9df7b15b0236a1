//! Pagination limits for the recent-window query.
//!
//! Out-of-range parameters degrade to the nearest valid page instead of
//! failing. Stores clamp on their side so every caller gets the same bounds.

/// Page size used when the caller asks for a non-positive limit.
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Largest page a single query may return.
pub const MAX_PAGE_LIMIT: u64 = 500;

/// A clamped `(limit, offset)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    /// Clamp raw caller input: limit into `[1, 500]` (non-positive → 50),
    /// offset to be non-negative.
    pub fn clamped(limit: i64, offset: i64) -> Self {
        let limit = if limit <= 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            (limit as u64).min(MAX_PAGE_LIMIT)
        };

        Self {
            limit,
            offset: offset.max(0) as u64,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}
