//! The composite repository: transactional fan-out across an ordered
//! sequence of parts, plus the reservation protocol.

use futures::future::{BoxFuture, FutureExt};

use conveyor_item::{Item, Mask, Part, Query, Reserver};

use crate::part::PartRepository;
use crate::Error;

/// Holds an ordered sequence of part repositories `P = [P1, ..., Pn]`.
/// Rows-like parts are conventionally first, Files-like last — append
/// stores data before the row that references it; delete protects a
/// still-referenced blob by checking the first part for other rows
/// sharing the digest before dropping the last part's copy.
pub struct Repository {
    parts: Vec<Box<dyn PartRepository>>,
}

impl Repository {
    pub fn new(parts: Vec<Box<dyn PartRepository>>) -> Result<Self, Error> {
        if parts.is_empty() {
            return Err(Error::ValidationError("repository requires at least one part".into()));
        }
        Ok(Repository { parts })
    }

    /// Strips the reserver, then appends to every part in reverse order.
    #[tracing::instrument(skip(self, item))]
    pub async fn append(&self, item: &Item) -> Result<(), Error> {
        let item = item.unreserved();
        for part in self.parts.iter().rev() {
            part.append(&item).await?;
        }
        Ok(())
    }

    /// Fans out across parts, then reserves each yielded candidate for
    /// `reserver_token` before returning it — the interleaved read+reserve
    /// is what makes two concurrent readers never receive the same item.
    #[tracing::instrument(skip(self, query))]
    pub async fn get(&self, query: &Query, reserver_token: &str) -> Result<Vec<Item>, Error> {
        let mut free_query = query.clone();
        free_query.mask.reserver = Some(Reserver::free());

        let candidates = fan_out(&self.parts, 0, &free_query, Part::new()).await?;
        let limit = query.limit.unwrap_or(u64::MAX);

        let mut results = Vec::new();
        for candidate in candidates {
            if results.len() as u64 >= limit {
                break;
            }

            let mut reserved = candidate.clone();
            reserved.reserver = Some(Reserver::token(reserver_token));

            match self.setitem_parts(&candidate, &reserved).await {
                Ok(()) => {
                    let mut item = candidate.into_item()?;
                    item.reserver = Reserver::token(reserver_token);
                    results.push(item);
                }
                // Another worker won the race for this candidate; move on.
                Err(Error::NotFound) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }

    #[tracing::instrument(skip(self, old, new))]
    pub async fn setitem(&self, old: &Item, new: &Item) -> Result<(), Error> {
        self.setitem_parts(&Part::from(old), &Part::from(new)).await
    }

    async fn setitem_parts(&self, old: &Part, new: &Part) -> Result<(), Error> {
        for part in self.parts.iter().rev() {
            part.setitem(old, new).await?;
        }
        Ok(())
    }

    /// Deletes in reverse order; once a part reports [`Error::NotFound`]
    /// the item is already gone from every part beneath it, so the
    /// remaining parts are skipped. The last part's blob is kept if another
    /// row still references the same digest.
    #[tracing::instrument(skip(self, item))]
    pub async fn delitem(&self, item: &Item) -> Result<(), Error> {
        let part = Part::from(item);
        let n = self.parts.len();

        let shared = if n > 1 {
            let mask = Mask::kind(item.kind.clone()).with_digest(item.data.digest());
            let query = Query::new(mask, Some(2))?;
            self.parts[0].get(&query, &Part::new()).await?.len() > 1
        } else {
            false
        };

        for (i, part_repo) in self.parts.iter().enumerate().rev() {
            if n > 1 && i == n - 1 && shared {
                continue;
            }
            match part_repo.delitem(&part).await {
                Ok(()) => {}
                Err(Error::NotFound) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Opens one transaction per part, in order, and returns a repository
    /// whose parts are the transactional handles. Reentrant: opening a
    /// transaction on an already-transactional part is a no-op there.
    pub async fn transaction(&self) -> Result<Repository, Error> {
        let mut parts = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            parts.push(part.transaction().await?);
        }
        Ok(Repository { parts })
    }

    /// Commits every part. A failure partway through — after at least one
    /// part already committed — is surfaced as [`Error::PartialCommit`]
    /// rather than retried or silently rolled back.
    pub async fn commit_transaction(&self) -> Result<(), Error> {
        let total = self.parts.len();
        let mut committed = 0;
        for part in &self.parts {
            match part.commit_transaction().await {
                Ok(()) => committed += 1,
                Err(e) => {
                    if committed > 0 {
                        return Err(Error::PartialCommit {
                            committed,
                            total,
                            source: Box::new(e),
                        });
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// The canonical item count, taken from the first (rows-like) part —
    /// the blob store's file count can differ under content dedup.
    pub async fn len(&self) -> Result<u64, Error> {
        self.parts[0].len().await
    }

    pub async fn clear(&self) -> Result<(), Error> {
        for part in &self.parts {
            part.clear().await?;
        }
        Ok(())
    }
}

fn fan_out<'a>(
    parts: &'a [Box<dyn PartRepository>],
    idx: usize,
    query: &'a Query,
    accumulator: Part,
) -> BoxFuture<'a, Result<Vec<Part>, Error>> {
    async move {
        if idx == parts.len() {
            return Ok(vec![accumulator]);
        }
        let partials = parts[idx].get(query, &accumulator).await?;
        let mut results = Vec::new();
        for partial in partials {
            results.extend(fan_out(parts, idx + 1, query, partial).await?);
        }
        Ok(results)
    }
    .boxed()
}
