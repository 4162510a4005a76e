/// Failure of a persistence operation.
///
/// Natural-key conflicts are not errors: they are resolved by overwrite
/// inside the upsert statement. Everything that reaches this type has
/// already rolled back.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The store was unreachable, the pool timed out, or a statement or
    /// commit failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A specific record in a bulk upsert was rejected by the store. The
    /// whole batch was rolled back.
    #[error("Asset at position {position} could not be saved: {source}")]
    BatchPosition {
        position: usize,
        #[source]
        source: sqlx::Error,
    },
}
