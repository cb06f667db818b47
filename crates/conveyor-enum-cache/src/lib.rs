//! Process-wide interning of low-cardinality metadata strings to small
//! integers.

mod bimap;
mod cache;
mod error;
mod registry;

pub use cache::Cache;
pub use error::Error;
pub use registry::{init, teardown};
