//! Repository for the asset catalog.
//!
//! Writes are upserts keyed on the natural key (`type`, `source`,
//! `identifiers`) and always run inside a transaction. Search delegates
//! parsing and ranking to PostgreSQL full-text search.
//!
//! Dropping any of these futures before completion drops the open
//! transaction, which rolls it back and returns the connection to the pool.

use catalog_core::asset::Asset;
use catalog_core::search::{
    clamp_limit, clamp_offset, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, SEARCH_CONFIG,
};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};

use crate::error::PersistenceError;
use crate::models::asset::AssetSearchResult;

/// Column list for search result rows. Expects `assets` aliased as `a`.
const SEARCH_COLUMNS: &str = "\
    a.id, a.type AS asset_type, a.source, a.identifiers, a.doc, \
    a.components, a.properties, a.created_at, a.modified_at, a.content";

/// Insert-or-overwrite on the natural key. `id` and `created_at` survive a
/// conflict; `modified_at` is refreshed.
const UPSERT_SQL: &str = "\
    INSERT INTO assets (type, source, identifiers, doc, components, properties) \
    VALUES ($1, $2, $3, $4, $5, $6) \
    ON CONFLICT ON CONSTRAINT uq_assets_natural_key \
    DO UPDATE SET \
        type = EXCLUDED.type, \
        source = EXCLUDED.source, \
        identifiers = EXCLUDED.identifiers, \
        doc = EXCLUDED.doc, \
        components = EXCLUDED.components, \
        properties = EXCLUDED.properties, \
        modified_at = now()";

/// Provides upsert and search operations for the asset catalog.
pub struct AssetRepo;

impl AssetRepo {
    // -----------------------------------------------------------------------
    // Upserts
    // -----------------------------------------------------------------------

    /// Insert a new asset or overwrite the one sharing its natural key.
    pub async fn upsert_one(pool: &PgPool, asset: &Asset) -> Result<(), PersistenceError> {
        let mut tx = pool.begin().await?;
        upsert_query(asset).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Upsert every asset in `assets` inside one transaction, in input order.
    ///
    /// Either all records are applied or none are. A record rejected by the
    /// store aborts the transaction, so only the first failing position is
    /// reported. Records sharing a natural key within the batch are applied
    /// in order and the last one wins.
    ///
    /// Returns the number of records applied.
    pub async fn upsert_many(pool: &PgPool, assets: &[Asset]) -> Result<u64, PersistenceError> {
        let mut tx = pool.begin().await?;

        for (position, asset) in assets.iter().enumerate() {
            upsert_query(asset)
                .execute(&mut *tx)
                .await
                .map_err(|err| attribute(position, err))?;
        }

        tx.commit().await?;
        Ok(assets.len() as u64)
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Full-text search over the derived asset content.
    ///
    /// `query` uses web search syntax and is parsed by
    /// `websearch_to_tsquery`, so arbitrary user input is safe. Results are
    /// ordered by `ts_rank` descending with `id` as a stable tiebreaker.
    /// Queries matching nothing (including stopword-only queries) return an
    /// empty vector.
    pub async fn search(
        pool: &PgPool,
        query: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<AssetSearchResult>, PersistenceError> {
        let limit = clamp_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
        let offset = clamp_offset(offset);

        let sql = format!(
            "SELECT {SEARCH_COLUMNS}, \
                    ts_rank(a.search_vector, q.tsq) AS rank, \
                    COUNT(*) OVER () AS row_count \
             FROM assets a, websearch_to_tsquery('{SEARCH_CONFIG}', $1) AS q(tsq) \
             WHERE a.search_vector @@ q.tsq \
             ORDER BY rank DESC, a.id \
             LIMIT $2 OFFSET $3"
        );

        let rows = sqlx::query_as::<_, AssetSearchResult>(&sql)
            .bind(query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}

/// Build the upsert statement for one asset.
fn upsert_query(asset: &Asset) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(UPSERT_SQL)
        .bind(&asset.asset_type)
        .bind(&asset.source)
        .bind(&asset.identifiers)
        .bind(&asset.doc)
        .bind(Json(&asset.components))
        .bind(Json(&asset.properties))
}

/// Pin record-level failures to their batch position.
///
/// Connection and protocol failures are not caused by any one record and
/// stay unattributed.
fn attribute(position: usize, err: sqlx::Error) -> PersistenceError {
    match err {
        sqlx::Error::Database(_) | sqlx::Error::Encode(_) => {
            PersistenceError::BatchPosition { position, source: err }
        }
        other => PersistenceError::Database(other),
    }
}
