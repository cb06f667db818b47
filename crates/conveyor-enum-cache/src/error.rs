#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no description found for enum value `{0}` in table `{1}`")]
    NotFound(i32, String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
