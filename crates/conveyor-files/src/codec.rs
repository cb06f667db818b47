use crate::Error;

/// A caller-chosen byte codec pair applied before write and read. The
/// identity codec is the common "no compression" choice; a real deployment
/// typically pairs this with a compressing codec.
pub trait Codec: Send + Sync {
    fn prepare(&self, raw: &[u8]) -> Vec<u8>;
    fn unprepare(&self, stored: &[u8]) -> Result<Vec<u8>, Error>;
}

/// The identity codec: `prepare`/`unprepare` are no-ops.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Codec for Identity {
    fn prepare(&self, raw: &[u8]) -> Vec<u8> {
        raw.to_vec()
    }

    fn unprepare(&self, stored: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(stored.to_vec())
    }
}

/// A caller-chosen transform applied to disambiguate a digest-path
/// collision. Applied to the *raw* value, not its prepared form; the result
/// is re-hashed and stored under its own digest's path.
pub trait Sidestep: Send + Sync {
    fn sidestep(&self, raw: &[u8]) -> Vec<u8>;
}

/// The identity sidestep: appends a single marker byte so that repeated
/// application eventually produces a value whose digest has no existing,
/// non-matching occupant.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppendMarker;

impl Sidestep for AppendMarker {
    fn sidestep(&self, raw: &[u8]) -> Vec<u8> {
        let mut out = raw.to_vec();
        out.push(0);
        out
    }
}
