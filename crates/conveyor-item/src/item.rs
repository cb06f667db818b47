use conveyor_digest::{Data, Digest, Word};

use crate::Metadata;

/// An opaque string identifier grouping related items (e.g. all items
/// produced from one source). Either supplied explicitly or derived from a
/// seed [`Data`] via its digest.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chain(String);

impl Chain {
    pub fn new(value: impl Into<String>) -> Self {
        Chain(value.into())
    }

    /// Derive a chain identifier from a seed value's content digest.
    pub fn from_seed(seed: &Data) -> Self {
        Chain(seed.digest().string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Chain {
    fn from(s: &str) -> Self {
        Chain::new(s)
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A timestamp without timezone; monotonic semantics are not assumed.
pub type Created = chrono::NaiveDateTime;

/// An optional opaque owner token. `None` means the item is free; `Some`
/// means a specific worker holds exclusive rights to mutate or delete it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Reserver(pub Option<String>);

impl Reserver {
    pub fn free() -> Self {
        Reserver(None)
    }

    pub fn token(token: impl Into<String>) -> Self {
        Reserver(Some(token.into()))
    }

    pub fn is_free(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// An immutable tuple `(kind, status, data, metadata, chain, created,
/// reserver)` — one durable unit of pipeline work.
///
/// Two items are equal iff all fields except `reserver` are equal:
/// reservation is a runtime lease over an item, not part of its identity.
#[derive(Clone, Debug)]
pub struct Item {
    pub kind: Word,
    pub status: Word,
    pub data: Data,
    pub metadata: Metadata,
    pub chain: Chain,
    pub created: Created,
    pub reserver: Reserver,
}

impl Item {
    pub fn new(
        kind: Word,
        status: Word,
        data: Data,
        metadata: Metadata,
        chain: Chain,
        created: Created,
    ) -> Self {
        Item {
            kind,
            status,
            data,
            metadata,
            chain,
            created,
            reserver: Reserver::free(),
        }
    }

    /// Returns a copy of this item stripped of its reserver.
    pub fn unreserved(&self) -> Self {
        Item {
            reserver: Reserver::free(),
            ..self.clone()
        }
    }

    /// Returns a copy of this item reserved by `token`.
    pub fn reserved_by(&self, token: impl Into<String>) -> Self {
        Item {
            reserver: Reserver::token(token),
            ..self.clone()
        }
    }

    /// The key tuple identifying this item's row independent of
    /// reservation: `(kind, digest, chain, created)`.
    pub fn identity_key(&self) -> (Word, Digest, Chain, Created) {
        (
            self.kind.clone(),
            self.data.digest(),
            self.chain.clone(),
            self.created,
        )
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.status == other.status
            && self.data == other.data
            && self.metadata == other.metadata
            && self.chain == other.chain
            && self.created == other.created
    }
}
impl Eq for Item {}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_digest::Data;
    use pretty_assertions::assert_eq;

    fn item(reserver: Reserver) -> Item {
        Item {
            kind: Word::new("kind").unwrap(),
            status: Word::new("status").unwrap(),
            data: Data::new(b"v".to_vec()),
            metadata: Metadata::new(),
            chain: Chain::new("c"),
            created: chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            reserver,
        }
    }

    #[test]
    fn equality_ignores_reserver() {
        let a = item(Reserver::free());
        let b = item(Reserver::token("worker-1"));
        assert_eq!(a, b);
    }
}
