//! Asset catalog read models and search DTOs.
//!
//! The write model (`Asset`) lives in `catalog_core::asset` so validation can
//! run without a database dependency.

use catalog_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity structs (database rows)
// ---------------------------------------------------------------------------

/// One ranked row from a full-text search over `assets`.
///
/// `rank` and `row_count` are computed per query and never stored.
/// `row_count` is the total number of matches, before pagination, repeated
/// on every row.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSearchResult {
    pub id: DbId,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub source: String,
    pub identifiers: Vec<String>,
    pub doc: String,
    pub components: serde_json::Value,
    pub properties: serde_json::Value,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
    pub rank: f32,
    pub content: String,
    pub row_count: i64,
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// Query parameters for `GET /assets/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetSearchParams {
    /// Free-text query in web search syntax (quoted phrases, `or`, `-term`).
    #[serde(default)]
    pub q: String,
    /// Maximum results (default 20, max 100).
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}
