//! The full error taxonomy. Only the composite repository aggregates all of
//! these; the parts beneath it raise their own narrower errors.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found")]
    NotFound,

    #[error("stored blob does not match its digest")]
    IntegrityCheck,

    #[error("metadata key `{key}` has type incompatible with existing column (column is {existing}, value is {attempted})")]
    SchemaConflict {
        key: String,
        existing: &'static str,
        attempted: &'static str,
    },

    #[error("storage backend error: {0}")]
    StorageBackend(String),

    #[error("item is reserved by another caller")]
    Reserved,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("composite transaction committed on {committed} of {total} parts before failing")]
    PartialCommit {
        committed: usize,
        total: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<conveyor_files::Error> for Error {
    fn from(e: conveyor_files::Error) -> Self {
        match e {
            conveyor_files::Error::NotFound(_) => Error::NotFound,
            conveyor_files::Error::IntegrityCheck(_) => Error::IntegrityCheck,
            conveyor_files::Error::Transform(t) => Error::StorageBackend(t.to_string()),
            conveyor_files::Error::Io(_, io) => Error::StorageBackend(io.to_string()),
        }
    }
}

impl From<conveyor_rows::Error> for Error {
    fn from(e: conveyor_rows::Error) -> Self {
        match e {
            conveyor_rows::Error::NotFound => Error::NotFound,
            conveyor_rows::Error::SchemaConflict {
                key,
                existing,
                attempted,
            } => Error::SchemaConflict {
                key,
                existing,
                attempted,
            },
            conveyor_rows::Error::Database(db) => Error::StorageBackend(db.to_string()),
            conveyor_rows::Error::EnumCache(c) => Error::StorageBackend(c.to_string()),
            conveyor_rows::Error::Item(i) => Error::ValidationError(i.to_string()),
            conveyor_rows::Error::Digest(d) => Error::ValidationError(d.to_string()),
        }
    }
}

impl From<conveyor_item::Error> for Error {
    fn from(e: conveyor_item::Error) -> Self {
        Error::ValidationError(e.to_string())
    }
}
