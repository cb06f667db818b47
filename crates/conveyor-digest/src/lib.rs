//! Content hashing and the byte container built on top of it.
//!
//! [`Digest`] is a fixed-width BLAKE3 hash with a canonical base64 textual
//! form; [`Data`] is an immutable byte sequence carrying its own digest.
//! [`Word`] is the `\w+`-constrained token type used for kinds, statuses,
//! and metadata keys throughout the rest of the workspace.

use std::fmt;

mod word;
pub use word::Word;

/// A fixed-width 32-byte BLAKE3 hash.
///
/// Two digests are equal iff their bytes are equal. `Digest` has no
/// knowledge of what produced it; it is a pure value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid base64 digest: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("digest must be exactly 32 bytes, got {0}")]
    WrongLength(usize),

    #[error("data does not match expected digest")]
    Mismatch,
}

impl Digest {
    pub const LEN: usize = 32;

    /// The digest of the empty byte sequence. Storage layers treat this as
    /// a sentinel: no blob is ever written for it.
    pub fn empty() -> Self {
        Digest::of(b"")
    }

    pub fn of(bytes: &[u8]) -> Self {
        Digest(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Canonical textual form: standard base64 (`+`/`/` alphabet, padded).
    /// Callers that need a path- or URL-safe form go through
    /// `conveyor-transform`'s `Segment`/`Desegment`, which rewrite the
    /// three unsafe characters this encoding can produce.
    pub fn string(&self) -> String {
        base64::encode_config(self.0, base64::STANDARD)
    }

    pub fn from_base64(s: &str) -> Result<Self, Error> {
        let bytes = base64::decode_config(s, base64::STANDARD)?;
        let exact: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::WrongLength(bytes.len()))?;
        Ok(Digest(exact))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.string())
    }
}

impl std::str::FromStr for Digest {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digest::from_base64(s)
    }
}

impl serde::Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.string().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;
        let s = String::deserialize(deserializer)?;
        Digest::from_base64(&s).map_err(|e| D::Error::custom(e.to_string()))
    }
}

/// An immutable byte sequence with a derived [`Digest`].
#[derive(Clone, PartialEq, Eq)]
pub struct Data {
    value: Vec<u8>,
    digest: Digest,
}

impl Data {
    pub fn new(value: Vec<u8>) -> Self {
        let digest = Digest::of(&value);
        Data { value, digest }
    }

    /// Construct `Data`, asserting the computed digest matches `expected`.
    /// Used by the Files core on read to detect blob corruption.
    pub fn verified(value: Vec<u8>, expected: Digest) -> Result<Self, Error> {
        let data = Data::new(value);
        if data.digest != expected {
            return Err(Error::Mismatch);
        }
        Ok(data)
    }

    pub fn empty() -> Self {
        Data::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.value
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.value)
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data")
            .field("digest", &self.digest)
            .field("len", &self.value.len())
            .finish()
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Data::new(value)
    }
}

impl From<&[u8]> for Data {
    fn from(value: &[u8]) -> Self {
        Data::new(value.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn digest_of_empty_is_stable() {
        assert_eq!(Digest::empty(), Digest::of(b""));
    }

    #[test]
    fn digest_roundtrips_through_base64() {
        let d = Digest::of(b"hello conveyor");
        let s = d.string();
        assert_eq!(Digest::from_base64(&s).unwrap(), d);
    }

    #[test]
    fn data_equality_ignores_nothing_but_value() {
        let a = Data::new(b"same".to_vec());
        let b = Data::new(b"same".to_vec());
        assert_eq!(a, b);
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn verified_rejects_mismatched_digest() {
        let wrong = Digest::of(b"other");
        assert!(matches!(
            Data::verified(b"value".to_vec(), wrong),
            Err(Error::Mismatch)
        ));
    }
}
