use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("blob not found: {0}")]
    NotFound(PathBuf),

    #[error("stored blob at {0:?} does not match its expected digest")]
    IntegrityCheck(PathBuf),

    #[error("transform failed: {0}")]
    Transform(#[from] conveyor_transform::Error),

    #[error("i/o error at {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}
