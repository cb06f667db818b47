use conveyor_digest::{Data, Digest, Word};

use crate::{Chain, Created, Error, Item, Metadata, Reserver};

/// A partial item accumulator used during the composite repository's query
/// fan-out: each field is an `Option` slot, filled progressively as each
/// backend part contributes what it knows. The rows part fills everything
/// but `data`; the files part fills `data` once it has a `digest` to
/// hydrate from.
#[derive(Clone, Debug, Default)]
pub struct Part {
    pub kind: Option<Word>,
    pub status: Option<Word>,
    pub digest: Option<Digest>,
    pub data: Option<Data>,
    pub metadata: Option<Metadata>,
    pub chain: Option<Chain>,
    pub created: Option<Created>,
    pub reserver: Option<Reserver>,
}

impl Part {
    pub fn new() -> Self {
        Part::default()
    }

    /// Assembles a complete [`Item`] once every required slot has been
    /// filled. Fails with [`Error::IncompleteItem`] if any part never
    /// contributed its piece.
    pub fn into_item(self) -> Result<Item, Error> {
        Ok(Item {
            kind: self.kind.ok_or(Error::IncompleteItem("kind"))?,
            status: self.status.ok_or(Error::IncompleteItem("status"))?,
            data: self.data.ok_or(Error::IncompleteItem("data"))?,
            metadata: self.metadata.ok_or(Error::IncompleteItem("metadata"))?,
            chain: self.chain.ok_or(Error::IncompleteItem("chain"))?,
            created: self.created.ok_or(Error::IncompleteItem("created"))?,
            reserver: self.reserver.ok_or(Error::IncompleteItem("reserver"))?,
        })
    }
}

impl From<&Item> for Part {
    fn from(item: &Item) -> Self {
        Part {
            kind: Some(item.kind.clone()),
            status: Some(item.status.clone()),
            digest: Some(item.data.digest()),
            data: Some(item.data.clone()),
            metadata: Some(item.metadata.clone()),
            chain: Some(item.chain.clone()),
            created: Some(item.created),
            reserver: Some(item.reserver.clone()),
        }
    }
}
