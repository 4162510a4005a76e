//! Route definitions for the asset catalog.
//!
//! All routes are mounted under `/assets`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::assets;
use crate::state::AppState;

/// Asset catalog routes mounted at `/assets`.
///
/// ```text
/// POST   /          -> upsert_asset
/// POST   /bulk      -> upsert_assets
/// GET    /search    -> search_assets
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(assets::upsert_asset))
        .route("/bulk", post(assets::upsert_assets))
        .route("/search", get(assets::search_assets))
}
