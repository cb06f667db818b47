//! Content-addressed blob store with transactional, dedup-aware writes.

mod codec;
mod core;
mod error;
mod transaction;

pub use codec::{AppendMarker, Codec, Identity, Sidestep};
pub use conveyor_transform::pathify::{constant as constant_granulation, Granulation};
pub use core::Core;
pub use error::Error;

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_digest::{Data, Digest};
    use pretty_assertions::assert_eq;

    fn core(root: &std::path::Path) -> Core {
        Core::with_defaults(root, "blob")
    }

    #[tokio::test]
    async fn append_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let data = Data::new(b"hello".to_vec());
        c.append(&data).await.unwrap();
        let got = c.get(data.digest()).await.unwrap();
        assert_eq!(got.value(), data.value());
    }

    #[tokio::test]
    async fn empty_payload_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let data = Data::empty();
        c.append(&data).await.unwrap();
        assert_eq!(c.len().await.unwrap(), 0);
        let got = c.get(Digest::empty()).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn duplicate_content_writes_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let a = Data::new(b"same".to_vec());
        let b = Data::new(b"same".to_vec());
        c.append(&a).await.unwrap();
        c.append(&b).await.unwrap();
        assert_eq!(c.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let err = c.get(Digest::of(b"never written")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn corrupted_blob_fails_integrity_check() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let data = Data::new(b"trustworthy".to_vec());
        c.append(&data).await.unwrap();

        let path = c.path(data.digest());
        tokio::fs::write(&path, b"tampered").await.unwrap();

        let err = c.get(data.digest()).await.unwrap_err();
        assert!(matches!(err, Error::IntegrityCheck(_)));
    }

    #[tokio::test]
    async fn delete_removes_the_blob() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let data = Data::new(b"gone soon".to_vec());
        c.append(&data).await.unwrap();
        c.delete(data.digest()).await.unwrap();
        assert!(!c.contains(data.digest()).await);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let err = c.delete(Digest::of(b"absent")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn transaction_rolls_back_on_mid_commit_failure() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());

        let first = Data::new(b"first".to_vec());
        let missing_digest = Digest::of(b"never written either");

        let txn = c.transaction();
        txn.append(&first).await.unwrap();
        txn.delete(missing_digest).await.unwrap();

        // The delete op fails because nothing was ever written for
        // `missing_digest`; the append staged earlier in the same
        // transaction must be rolled back.
        let err = txn.commit_transaction().await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(c.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn nested_transaction_shares_the_parent_log() {
        let dir = tempfile::tempdir().unwrap();
        let c = core(dir.path());
        let outer = c.transaction();
        let inner = outer.transaction();
        assert!(inner.is_transactional());

        let data = Data::new(b"shared log".to_vec());
        inner.append(&data).await.unwrap();
        // Nothing is written until the outer handle's op log is flushed;
        // `append` on a transactional handle only stages.
        assert_eq!(c.len().await.unwrap(), 0);
    }
}
