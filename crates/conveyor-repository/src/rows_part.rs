use async_trait::async_trait;
use conveyor_item::{Item, Mask, Query, Word};

use crate::part::PartRepository;
use crate::Error;

/// Wraps [`conveyor_rows::RowsCore`] bound to one item kind as a part
/// repository. Each `Repository` serves a single kind, so the kind is
/// fixed at construction rather than read back out of every mask.
pub struct RowsPart {
    kind: Word,
    core: conveyor_rows::RowsCore,
}

impl RowsPart {
    pub fn new(kind: Word, core: conveyor_rows::RowsCore) -> Self {
        RowsPart { kind, core }
    }

    fn identity_mask(&self, part: &conveyor_item::Part) -> Mask {
        Mask {
            kind: Some(self.kind.clone()),
            status: part.status.clone(),
            digest: part.digest,
            chain: part.chain.clone(),
            created: part.created,
            reserver: part.reserver.clone(),
            metadata: Vec::new(),
        }
    }

    /// Called when an identity-scoped `UPDATE`/`DELETE` affected zero rows.
    /// Re-checks existence with the reserver constraint relaxed so a row
    /// held by another caller is reported as [`Error::Reserved`] rather
    /// than the misleading [`Error::NotFound`].
    async fn not_found_or_reserved(&self, mask: &Mask) -> Error {
        let mut relaxed = mask.clone();
        relaxed.reserver = None;
        match self.core.contains(&self.kind, &relaxed).await {
            Ok(true) => Error::Reserved,
            _ => Error::NotFound,
        }
    }
}

/// Only the fields that actually changed between `old` and `new`, so the
/// generated `UPDATE` touches the minimum column set. Metadata is diffed
/// key by key rather than as a single opaque column: resending the whole
/// map on any single-key change would clobber a concurrent writer's update
/// to an unrelated key, since `identity_mask` doesn't constrain on it.
fn diff(old: &conveyor_item::Part, new: &conveyor_item::Part) -> conveyor_item::Part {
    let mut out = conveyor_item::Part::new();
    if old.status != new.status {
        out.status = new.status.clone();
    }
    if old.chain != new.chain {
        out.chain = new.chain.clone();
    }
    if old.created != new.created {
        out.created = new.created;
    }
    if old.reserver != new.reserver {
        out.reserver = new.reserver.clone();
    }

    let empty = conveyor_item::Metadata::new();
    let old_metadata = old.metadata.as_ref().unwrap_or(&empty);
    let new_metadata = new.metadata.as_ref().unwrap_or(&empty);
    if old_metadata != new_metadata {
        let keys: std::collections::BTreeSet<_> =
            old_metadata.keys().chain(new_metadata.keys()).collect();
        let changed: Vec<_> = keys
            .into_iter()
            .filter(|key| old_metadata.get(key) != new_metadata.get(key))
            .filter_map(|key| new_metadata.get(key).map(|value| (key.clone(), value.clone())))
            .collect();
        if !changed.is_empty() {
            out.metadata = Some(conveyor_item::Metadata::from_iter(changed));
        }
    }
    out
}

#[async_trait]
impl PartRepository for RowsPart {
    async fn append(&self, item: &Item) -> Result<(), Error> {
        Ok(self.core.append(&self.kind, item).await?)
    }

    async fn get(
        &self,
        query: &Query,
        _accumulator: &conveyor_item::Part,
    ) -> Result<Vec<conveyor_item::Part>, Error> {
        Ok(self.core.get(&self.kind, query).await?)
    }

    async fn setitem(&self, old: &conveyor_item::Part, new: &conveyor_item::Part) -> Result<(), Error> {
        let mask = self.identity_mask(old);
        let changed = diff(old, new);
        match self.core.setitem(&self.kind, &mask, &changed).await {
            Ok(()) => Ok(()),
            Err(conveyor_rows::Error::NotFound) => Err(self.not_found_or_reserved(&mask).await),
            Err(e) => Err(e.into()),
        }
    }

    async fn delitem(&self, item: &conveyor_item::Part) -> Result<(), Error> {
        let mask = self.identity_mask(item);
        match self.core.delitem(&self.kind, &mask).await {
            Ok(()) => Ok(()),
            Err(conveyor_rows::Error::NotFound) => Err(self.not_found_or_reserved(&mask).await),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, mask: &Mask) -> Result<bool, Error> {
        Ok(self.core.contains(&self.kind, mask).await?)
    }

    async fn transaction(&self) -> Result<Box<dyn PartRepository>, Error> {
        Ok(Box::new(RowsPart::new(self.kind.clone(), self.core.transaction().await?)))
    }

    async fn commit_transaction(&self) -> Result<(), Error> {
        Ok(self.core.commit_transaction().await?)
    }

    async fn len(&self) -> Result<u64, Error> {
        Ok(self.core.len(&self.kind).await?)
    }

    async fn clear(&self) -> Result<(), Error> {
        Ok(self.core.clear(&self.kind).await?)
    }
}
