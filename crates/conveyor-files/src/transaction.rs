use std::path::PathBuf;
use std::sync::Mutex;

use conveyor_digest::Digest;

/// A staged operation against the blob store, queued until `commit`.
pub(crate) enum Op {
    /// Write `value`'s bytes (content-addressed by `digest`) to whatever
    /// path the owning [`crate::Core`] derives for it, resolving digest
    /// collisions along the way.
    Append { digest: Digest, value: Vec<u8> },
    Delete { digest: Digest },
}

/// An inverse action recorded after a forward op succeeds, replayed in
/// reverse by [`Transaction::rollback_with`] if a later op in the same
/// transaction fails.
pub(crate) enum Rollback {
    RemoveFile(PathBuf),
    RestoreFile(PathBuf, Vec<u8>),
    Noop,
}

/// An ordered log of staged ops. Holds no I/O logic itself — [`crate::Core`]
/// interprets each [`Op`] using its own `prepare`/`sidestep`/`pathify`
/// transforms, since resolving a digest collision needs those.
#[derive(Default)]
pub struct Transaction {
    pub(crate) ops: Mutex<Vec<Op>>,
}

impl Transaction {
    pub fn new() -> Self {
        Transaction {
            ops: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn stage(&self, op: Op) {
        self.ops.lock().expect("transaction mutex poisoned").push(op);
    }

    pub(crate) fn take_ops(&self) -> Vec<Op> {
        std::mem::take(&mut *self.ops.lock().expect("transaction mutex poisoned"))
    }
}

/// Writes `bytes` to `target` by first writing a temp file in the same
/// directory, fsyncing it, then renaming it into place.
pub(crate) async fn write_atomic(
    target: &std::path::Path,
    bytes: &[u8],
) -> Result<(), crate::Error> {
    use crate::Error;

    let dir = target.parent().ok_or_else(|| {
        Error::Io(
            target.to_path_buf(),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent directory"),
        )
    })?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::Io(target.to_path_buf(), e))?;

    let tmp_name = format!(
        ".{}.{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        uuid::Uuid::new_v4()
    );
    let tmp_path = dir.join(tmp_name);

    {
        use tokio::io::AsyncWriteExt;
        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| Error::Io(tmp_path.clone(), e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| Error::Io(tmp_path.clone(), e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Io(tmp_path.clone(), e))?;
    }

    tokio::fs::rename(&tmp_path, target)
        .await
        .map_err(|e| Error::Io(target.to_path_buf(), e))?;
    Ok(())
}
