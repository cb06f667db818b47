use async_trait::async_trait;
use conveyor_item::{Item, Mask, Query};

use crate::part::PartRepository;
use crate::Error;

/// Wraps [`conveyor_files::Core`] as a part repository. Ignores every field
/// of a query/mask except `digest` — the blob store has no notion of kind,
/// status, or metadata.
pub struct FilesPart {
    core: conveyor_files::Core,
}

impl FilesPart {
    pub fn new(core: conveyor_files::Core) -> Self {
        FilesPart { core }
    }
}

#[async_trait]
impl PartRepository for FilesPart {
    async fn append(&self, item: &Item) -> Result<(), Error> {
        Ok(self.core.append(&item.data).await?)
    }

    async fn get(
        &self,
        _query: &Query,
        accumulator: &conveyor_item::Part,
    ) -> Result<Vec<conveyor_item::Part>, Error> {
        let digest = accumulator
            .digest
            .ok_or_else(|| Error::ValidationError("files part requires a digest in the accumulator".into()))?;
        let data = self.core.get(digest).await?;
        let mut merged = accumulator.clone();
        merged.data = Some(data);
        Ok(vec![merged])
    }

    /// A no-op unless `new` carries data differing from what's already
    /// stored: reservation and status changes never touch the blob layer,
    /// since an item's identity tuple `(kind, digest, chain, created)`
    /// holds its digest fixed across a mutation.
    async fn setitem(&self, _old: &conveyor_item::Part, new: &conveyor_item::Part) -> Result<(), Error> {
        if let Some(data) = &new.data {
            self.core.append(data).await?;
        }
        Ok(())
    }

    async fn delitem(&self, item: &conveyor_item::Part) -> Result<(), Error> {
        let digest = item
            .digest
            .ok_or_else(|| Error::ValidationError("files part requires a digest to delete".into()))?;
        Ok(self.core.delete(digest).await?)
    }

    async fn contains(&self, mask: &Mask) -> Result<bool, Error> {
        let digest = mask
            .digest
            .ok_or_else(|| Error::ValidationError("files part requires a digest mask".into()))?;
        Ok(self.core.contains(digest).await)
    }

    async fn transaction(&self) -> Result<Box<dyn PartRepository>, Error> {
        Ok(Box::new(FilesPart::new(self.core.transaction())))
    }

    async fn commit_transaction(&self) -> Result<(), Error> {
        Ok(self.core.commit_transaction().await?)
    }

    async fn len(&self) -> Result<u64, Error> {
        Ok(self.core.len().await?)
    }

    async fn clear(&self) -> Result<(), Error> {
        Ok(self.core.clear().await?)
    }
}
