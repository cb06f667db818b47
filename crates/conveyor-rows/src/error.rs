#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("row not found")]
    NotFound,

    #[error("metadata key `{key}` has type incompatible with existing column (column is {existing}, value is {attempted})")]
    SchemaConflict {
        key: String,
        existing: &'static str,
        attempted: &'static str,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    EnumCache(#[from] conveyor_enum_cache::Error),

    #[error(transparent)]
    Item(#[from] conveyor_item::Error),

    #[error(transparent)]
    Digest(#[from] conveyor_digest::Error),
}
