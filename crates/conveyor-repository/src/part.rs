//! The uniform interface Files and Rows present to the composite
//! repository.

use async_trait::async_trait;
use conveyor_item::{Item, Mask, Query};

use crate::Error;

/// One backend of a [`crate::Repository`]. Implemented by a Files-backed
/// part (the blob store) and a Rows-backed part (the relational store);
/// the composite fans out across an ordered sequence of these.
#[async_trait]
pub trait PartRepository: Send + Sync {
    async fn append(&self, item: &Item) -> Result<(), Error>;

    /// Yields one [`conveyor_item::Part`] per match, using `accumulator` as
    /// whatever the prior part in the fan-out already contributed. Files'
    /// implementation ignores `query`'s mask entirely and yields a single
    /// part hydrated from `accumulator`'s digest.
    async fn get(
        &self,
        query: &Query,
        accumulator: &conveyor_item::Part,
    ) -> Result<Vec<conveyor_item::Part>, Error>;

    async fn setitem(&self, old: &conveyor_item::Part, new: &conveyor_item::Part) -> Result<(), Error>;

    async fn delitem(&self, item: &conveyor_item::Part) -> Result<(), Error>;

    async fn contains(&self, mask: &Mask) -> Result<bool, Error>;

    /// Opens a transactional handle. Reentrant on an already-transactional
    /// handle, returning a handle that shares it rather than nesting.
    async fn transaction(&self) -> Result<Box<dyn PartRepository>, Error>;

    /// Flushes the outermost transaction opened by [`PartRepository::transaction`].
    async fn commit_transaction(&self) -> Result<(), Error>;

    async fn len(&self) -> Result<u64, Error>;

    async fn clear(&self) -> Result<(), Error>;
}
