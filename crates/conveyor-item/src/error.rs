#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("metadata key `{0}` is reserved and cannot be used as a field name")]
    ReservedKey(String),

    #[error("query result limit must be greater than 0")]
    InvalidLimit,

    #[error("mask is missing a mandatory `kind`")]
    MissingKind,

    #[error("part is missing required field `{0}` to assemble a complete item")]
    IncompleteItem(&'static str),
}
