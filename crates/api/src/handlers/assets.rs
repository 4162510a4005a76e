//! Handlers for the asset catalog.
//!
//! Every handler runs the validation gate before touching the pool, so
//! malformed input never reaches the database.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use catalog_core::asset::{validate_asset, validate_batch, Asset};
use catalog_core::search::validate_search_query;
use catalog_db::models::asset::{AssetSearchParams, AssetSearchResult};
use catalog_db::repositories::AssetRepo;

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

/// POST /api/v1/assets
///
/// Upsert a single asset keyed on (`type`, `source`, `identifiers`).
/// Responds `200 OK` with an empty body.
pub async fn upsert_asset(
    State(state): State<AppState>,
    AppJson(asset): AppJson<Asset>,
) -> AppResult<StatusCode> {
    validate_asset(&asset)?;

    AssetRepo::upsert_one(&state.pool, &asset).await?;

    tracing::debug!(
        asset_type = %asset.asset_type,
        source = %asset.source,
        identifiers = ?asset.identifiers,
        "Asset upserted",
    );

    Ok(StatusCode::OK)
}

/// POST /api/v1/assets/bulk
///
/// Upsert an array of assets atomically: all are applied or none are.
/// Responds `200 OK` with an empty body.
pub async fn upsert_assets(
    State(state): State<AppState>,
    AppJson(assets): AppJson<Vec<Asset>>,
) -> AppResult<StatusCode> {
    validate_batch(&assets)?;

    let applied = AssetRepo::upsert_many(&state.pool, &assets).await?;

    tracing::info!(applied, "Asset batch upserted");

    Ok(StatusCode::OK)
}

/// GET /api/v1/assets/search?q=&limit=&offset=
///
/// Full-text search ranked by relevance. Responds with a JSON array, empty
/// when nothing matches.
pub async fn search_assets(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AssetSearchParams>,
) -> AppResult<Json<Vec<AssetSearchResult>>> {
    let query = validate_search_query(&params.q)?;

    let results = AssetRepo::search(&state.pool, query, params.limit, params.offset).await?;

    tracing::debug!(
        query,
        results = results.len(),
        total = results.first().map_or(0, |r| r.row_count),
        "Asset search executed",
    );

    Ok(Json(results))
}
