use conveyor_digest::{Digest, Word};

use crate::{Chain, Created, Error, Reserver};

/// A partial item pattern: any subset of
/// `{status, digest, chain, created, reserver, metadata}` may be set.
/// `kind` is mandatory — it selects the table.
///
/// A mask with `reserver: Some(Reserver::free())` matches only rows with a
/// `NULL` reserver; a mask with `reserver: None` (omitted) matches any
/// reserver value.
#[derive(Clone, Debug, Default)]
pub struct Mask {
    pub kind: Option<Word>,
    pub status: Option<Word>,
    pub digest: Option<Digest>,
    pub chain: Option<Chain>,
    pub created: Option<Created>,
    pub reserver: Option<Reserver>,
    pub metadata: Vec<(Word, crate::metadata::Value)>,
}

impl Mask {
    pub fn kind(kind: Word) -> Self {
        Mask {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Word) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_digest(mut self, digest: Digest) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_created(mut self, created: Created) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_reserver(mut self, reserver: Reserver) -> Self {
        self.reserver = Some(reserver);
        self
    }

    pub fn free_only(mut self) -> Self {
        self.reserver = Some(Reserver::free());
        self
    }

    pub fn with_metadata(mut self, key: Word, value: crate::metadata::Value) -> Self {
        self.metadata.push((key, value));
        self
    }

    pub fn kind_or_err(&self) -> Result<&Word, Error> {
        self.kind.as_ref().ok_or(Error::MissingKind)
    }
}

/// `(Mask, limit)`. A `limit` of zero is invalid.
#[derive(Clone, Debug)]
pub struct Query {
    pub mask: Mask,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new(mask: Mask, limit: Option<u64>) -> Result<Self, Error> {
        if let Some(0) = limit {
            return Err(Error::InvalidLimit);
        }
        Ok(Query { mask, limit })
    }

    /// Returns a copy of this query with the mask's reserver constrained to
    /// "free only" — the composite repository does this before fanning out
    /// a read, since only unreserved items are candidates.
    pub fn free_only(&self) -> Self {
        Query {
            mask: self.mask.clone().free_only(),
            limit: self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_limit() {
        let mask = Mask::kind(Word::new("k").unwrap());
        assert!(matches!(Query::new(mask, Some(0)), Err(Error::InvalidLimit)));
    }
}
