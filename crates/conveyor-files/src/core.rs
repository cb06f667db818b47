use std::path::PathBuf;
use std::sync::Arc;

use conveyor_digest::{Data, Digest};
use conveyor_transform::pathify::{self, Granulation};

use crate::codec::{Codec, Sidestep};
use crate::error::Error;
use crate::transaction::{Op, Transaction};

/// Content-addressed blob store with transactional, dedup-aware writes.
#[derive(Clone)]
pub struct Core {
    root: PathBuf,
    suffix: String,
    granulation: Granulation,
    codec: Arc<dyn Codec>,
    sidestep: Arc<dyn Sidestep>,
    transaction: Option<Arc<Transaction>>,
}

const MAX_SIDESTEP_ATTEMPTS: usize = 8;

impl Core {
    pub fn new(
        root: impl Into<PathBuf>,
        suffix: impl Into<String>,
        granulation: Granulation,
        codec: Arc<dyn Codec>,
        sidestep: Arc<dyn Sidestep>,
    ) -> Self {
        Core {
            root: root.into(),
            suffix: suffix.into(),
            granulation,
            codec,
            sidestep,
            transaction: None,
        }
    }

    /// Convenience constructor using the identity codec and an
    /// append-marker sidestep — adequate unless the caller wants
    /// compression on disk.
    pub fn with_defaults(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Core::new(
            root,
            suffix,
            pathify::constant(2),
            Arc::new(crate::codec::Identity),
            Arc::new(crate::codec::AppendMarker),
        )
    }

    pub fn path(&self, digest: Digest) -> PathBuf {
        let relative = pathify::path_of(&self.granulation, digest)
            .expect("pathify is a Safe transform and never fails");
        let mut path = self.root.join(relative);
        path.set_extension(self.suffix.trim_start_matches('.'));
        path
    }

    fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    fn txn(&self) -> Arc<Transaction> {
        self.transaction
            .clone()
            .unwrap_or_else(|| Arc::new(Transaction::new()))
    }

    /// Opens a scoped transaction handle. Nested calls on an
    /// already-transactional handle return a clone sharing the same op log
    /// instead of starting a second one.
    pub fn transaction(&self) -> Core {
        if self.in_transaction() {
            return self.clone();
        }
        Core {
            transaction: Some(self.txn()),
            ..self.clone()
        }
    }

    pub fn is_transactional(&self) -> bool {
        self.in_transaction()
    }

    /// Flushes every op staged on this transactional handle. Only the
    /// caller that opened the outermost `transaction()` should call this —
    /// a composite repository's nested-transaction protocol relies on that.
    pub async fn commit_transaction(&self) -> Result<(), Error> {
        let txn = self
            .transaction
            .clone()
            .expect("commit_transaction called on a non-transactional handle");
        self.commit(&txn).await
    }

    /// Stages the blob write. Empty data is never written; the call is a
    /// committed no-op for the top-level handle, a staged no-op inside an
    /// existing transaction.
    #[tracing::instrument(skip(self, data), fields(digest = %data.digest()))]
    pub async fn append(&self, data: &Data) -> Result<(), Error> {
        if data.is_empty() {
            return Ok(());
        }

        let txn = self.txn();
        txn.stage(Op::Append {
            digest: data.digest(),
            value: data.value().to_vec(),
        });

        if !self.in_transaction() {
            self.commit(&txn).await?;
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, digest: Digest) -> Result<Data, Error> {
        if digest == Digest::empty() {
            return Ok(Data::empty());
        }

        let path = self.path(digest);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound(path.clone()),
                _ => Error::Io(path.clone(), e),
            })?;
        let decoded = self.codec.unprepare(&bytes)?;
        Data::verified(decoded, digest).map_err(|_| Error::IntegrityCheck(path))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, digest: Digest) -> Result<(), Error> {
        let txn = self.txn();
        txn.stage(Op::Delete { digest });

        if !self.in_transaction() {
            self.commit(&txn).await?;
        }
        Ok(())
    }

    pub async fn contains(&self, digest: Digest) -> bool {
        tokio::fs::try_exists(self.path(digest)).await.unwrap_or(false)
    }

    pub async fn len(&self) -> Result<u64, Error> {
        let mut count = 0u64;
        let mut stack = vec![self.root.clone()];
        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::Io(dir, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Error::Io(dir.clone(), e))?
            {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path
                    .extension()
                    .map(|e| e == self.suffix.trim_start_matches('.'))
                    .unwrap_or(false)
                {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    pub async fn clear(&self) -> Result<(), Error> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(self.root.clone(), e)),
        }
    }

    /// Replays the staged op log, applying the collision-resolution
    /// protocol for appends. Any failure rolls back the ops already
    /// applied, in reverse order.
    async fn commit(&self, txn: &Transaction) -> Result<(), Error> {
        let ops = txn.take_ops();
        let mut applied: Vec<crate::transaction::Rollback> = Vec::with_capacity(ops.len());

        for op in &ops {
            match self.apply_op(op).await {
                Ok(rollback) => applied.push(rollback),
                Err(e) => {
                    self.rollback(applied).await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn apply_op(&self, op: &Op) -> Result<crate::transaction::Rollback, Error> {
        use crate::transaction::Rollback;

        match op {
            Op::Append { digest, value } => self.apply_append(*digest, value).await,
            Op::Delete { digest } => {
                let path = self.path(*digest);
                let existing = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => Error::NotFound(path.clone()),
                    _ => Error::Io(path.clone(), e),
                })?;
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| Error::Io(path.clone(), e))?;
                Ok(Rollback::RestoreFile(path, existing))
            }
        }
    }

    /// Write-if-absent, verify-if-present, sidestep-on-mismatch.
    async fn apply_append(
        &self,
        digest: Digest,
        value: &[u8],
    ) -> Result<crate::transaction::Rollback, Error> {
        use crate::transaction::Rollback;

        let mut target = self.path(digest);
        let mut candidate = value.to_vec();

        for _ in 0..MAX_SIDESTEP_ATTEMPTS {
            if !target.exists() {
                crate::transaction::write_atomic(&target, &self.codec.prepare(&candidate)).await?;
                return Ok(Rollback::RemoveFile(target));
            }

            let stored = tokio::fs::read(&target)
                .await
                .map_err(|e| Error::Io(target.clone(), e))?;
            let decoded = self.codec.unprepare(&stored)?;
            if decoded == candidate {
                // Idempotent: identical content already present.
                return Ok(Rollback::Noop);
            }

            candidate = self.sidestep.sidestep(&candidate);
            target = self.path(Digest::of(&candidate));
        }

        Err(Error::IntegrityCheck(target))
    }

    async fn rollback(&self, rollbacks: Vec<crate::transaction::Rollback>) {
        use crate::transaction::Rollback;
        for r in rollbacks.into_iter().rev() {
            match r {
                Rollback::RemoveFile(path) => {
                    let _ = tokio::fs::remove_file(&path).await;
                }
                Rollback::RestoreFile(path, bytes) => {
                    let _ = crate::transaction::write_atomic(&path, &bytes).await;
                }
                Rollback::Noop => {}
            }
        }
    }
}
