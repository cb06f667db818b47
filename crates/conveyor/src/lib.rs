//! Conveyor: a composite, transactional repository for cold pipelines.
//! Persists items across a content-addressed blob store and a relational
//! metadata store, with atomic multi-store mutation, dedup, reservation,
//! and live schema evolution.
//!
//! This crate is a thin facade over the component crates — see each for
//! the detailed design: [`conveyor_digest`], [`conveyor_transform`],
//! [`conveyor_item`], [`conveyor_files`], [`conveyor_enum_cache`],
//! [`conveyor_rows`], [`conveyor_repository`].

pub use conveyor_digest::{Data, Digest, Word};
pub use conveyor_item::{Chain, Created, Enumerable, Item, Mask, Metadata, Part, Query, Reserver, Value};
pub use conveyor_repository::{Error, FilesPart, PartRepository, Repository, RowsPart};

/// The content-addressed blob store.
pub mod files {
    pub use conveyor_files::{constant_granulation, AppendMarker, Codec, Core, Granulation, Identity, Sidestep};
}

/// The queryable relational store with live schema migration.
pub mod rows {
    pub use conveyor_rows::{enum_table_name, table_name, Error, RowsCore};
}

/// The process-wide enum-interning cache.
pub mod enum_cache {
    pub use conveyor_enum_cache::{init, teardown, Cache, Error};
}
