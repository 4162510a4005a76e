//! Full-text search constants and helpers.
//!
//! Ranking itself happens in PostgreSQL; this module only normalizes what the
//! caller sends before it reaches the repository.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Text search configuration
// ---------------------------------------------------------------------------

/// PostgreSQL text search configuration used for both indexing and querying.
///
/// Must match the configuration used by the `assets_refresh_search` trigger.
pub const SEARCH_CONFIG: &str = "english";

/// Maximum accepted length of a search query, in characters.
pub const MAX_QUERY_LENGTH: usize = 512;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default number of search results per page.
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;

/// Maximum number of search results per page.
pub const MAX_SEARCH_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Validate a free-text search query and return it trimmed.
pub fn validate_search_query(query: &str) -> Result<&str, CoreError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "q: search query must not be empty".to_string(),
        ));
    }
    let len = trimmed.chars().count();
    if len > MAX_QUERY_LENGTH {
        return Err(CoreError::Validation(format!(
            "q: search query must be at most {MAX_QUERY_LENGTH} characters, got {len}"
        )));
    }
    Ok(trimmed)
}

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
