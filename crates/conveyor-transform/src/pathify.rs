//! Derive a filesystem path from a [`Digest`], and reassemble a digest from
//! such a path. A `Segment` transform rewrites filesystem-unsafe base64
//! characters to literal tokens, composed with a `Group` transform that
//! buckets the segmented characters into nested directory names for
//! fan-out control.

use std::path::{Component, Path, PathBuf};

use conveyor_digest::Digest;

use crate::{Compose, Error, Transform};

/// `g(n)` returns the width of the `n`-th path component produced by
/// [`Group`]. Callers tune directory fan-out by shaping this function.
pub type Granulation = std::sync::Arc<dyn Fn(usize) -> usize + Send + Sync>;

fn segment_char(c: char) -> String {
    match c {
        '+' => "plus".to_string(),
        '/' => "slash".to_string(),
        '=' => "equal".to_string(),
        other => other.to_string(),
    }
}

fn desegment_token(token: &str) -> String {
    match token {
        "plus" => "+".to_string(),
        "slash" => "/".to_string(),
        "equal" => "=".to_string(),
        other => other.to_string(),
    }
}

/// `Digest -> Vec<String>`: one entry per character, filesystem-unsafe
/// base64 characters rewritten to literal words.
#[derive(Clone, Copy, Debug, Default)]
pub struct Segment;

/// Inverse of [`Segment`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Desegment;

impl Transform<Digest, Vec<String>> for Segment {
    type Inverse = Desegment;

    fn apply(&self, input: Digest) -> Result<Vec<String>, Error> {
        Ok(input.string().chars().map(segment_char).collect())
    }

    fn invert(&self) -> Desegment {
        Desegment
    }
}

impl Transform<Vec<String>, Digest> for Desegment {
    type Inverse = Segment;

    fn apply(&self, input: Vec<String>) -> Result<Digest, Error> {
        let joined: String = input.into_iter().map(|s| desegment_token(&s)).collect();
        Digest::from_base64(&joined).map_err(|e| Error::Trusted(e.to_string()))
    }

    fn invert(&self) -> Segment {
        Segment
    }
}

/// `Vec<String> -> PathBuf`: buckets single-character segments into nested
/// directory names of widths given by `granulation`; multi-character
/// segments (the literal `plus`/`slash`/`equal` tokens) pass through as
/// their own path component.
#[derive(Clone)]
pub struct Group {
    granulation: Granulation,
}

impl Group {
    pub fn new(granulation: Granulation) -> Self {
        Group { granulation }
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").finish_non_exhaustive()
    }
}

/// Inverse of [`Group`]; needs the same granulation function to know where
/// grouped components end and literal tokens begin is unnecessary here —
/// grouped components are recognized because they are exactly one
/// character wide once split, while literal tokens are the fixed set
/// `{plus, slash, equal}`.
#[derive(Clone)]
pub struct Ungroup {
    granulation: Granulation,
}

impl std::fmt::Debug for Ungroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ungroup").finish_non_exhaustive()
    }
}

fn is_literal_token(s: &str) -> bool {
    matches!(s, "plus" | "slash" | "equal")
}

impl Transform<Vec<String>, PathBuf> for Group {
    type Inverse = Ungroup;

    fn apply(&self, input: Vec<String>) -> Result<PathBuf, Error> {
        let mut components = Vec::new();
        let mut buffer = String::new();
        let mut n = 0usize;

        for element in input {
            if element.chars().count() == 1 {
                buffer.push_str(&element);
                if buffer.chars().count() == (self.granulation)(n) {
                    components.push(buffer.clone());
                    buffer.clear();
                    n += 1;
                }
            } else {
                if !buffer.is_empty() {
                    components.push(buffer.clone());
                    buffer.clear();
                    n += 1;
                }
                components.push(element);
                n += 1;
            }
        }
        if !buffer.is_empty() {
            components.push(buffer);
        }

        Ok(components.into_iter().collect())
    }

    fn invert(&self) -> Ungroup {
        Ungroup {
            granulation: self.granulation.clone(),
        }
    }
}

impl Transform<PathBuf, Vec<String>> for Ungroup {
    type Inverse = Group;

    fn apply(&self, input: PathBuf) -> Result<Vec<String>, Error> {
        let mut result = Vec::new();
        for component in input.components() {
            let Component::Normal(part) = component else {
                continue;
            };
            let part = part.to_string_lossy();
            if is_literal_token(&part) {
                result.push(part.to_string());
            } else {
                result.extend(part.chars().map(|c| c.to_string()));
            }
        }
        Ok(result)
    }

    fn invert(&self) -> Group {
        Group {
            granulation: self.granulation.clone(),
        }
    }
}

/// `Segment + Group(granulation)`: the full digest-to-path transform.
pub type PathifyTransform = Compose<Segment, Group>;
/// Inverse of [`PathifyTransform`]: reassembles a digest from a path.
pub type UnpathifyTransform = Compose<Ungroup, Desegment>;

/// Builds the composed digest-to-path transform.
pub struct Pathify;

impl Pathify {
    pub fn new(granulation: Granulation) -> PathifyTransform {
        Compose(Segment, Group::new(granulation))
    }
}

/// A granulation that yields `width`-character directory components for
/// every position — the common case (e.g. `constant(2)` for two-level
/// fan-out of two hex/base64 characters per directory).
pub fn constant(width: usize) -> Granulation {
    std::sync::Arc::new(move |_n: usize| width)
}

pub fn path_of(granulation: &Granulation, digest: Digest) -> Result<PathBuf, Error> {
    Pathify::new(granulation.clone()).apply(digest)
}

pub fn digest_of(granulation: &Granulation, path: &Path) -> Result<Digest, Error> {
    Pathify::new(granulation.clone()).invert().apply(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn roundtrips_through_segment_and_group() {
        let digest = Digest::of(b"pathify me");
        let g = constant(2);
        let path = path_of(&g, digest).unwrap();
        let recovered = digest_of(&g, &path).unwrap();
        assert_eq!(recovered, digest);
    }

    #[test]
    fn filesystem_unsafe_characters_become_literal_components() {
        // 32 bytes of 0xFF base64-encodes to forty '/' characters, an '8',
        // and one padding '=' — a digest guaranteed to exercise both the
        // slash and equal rewrite branches.
        let encoded = "/".repeat(40) + "//8=";
        let digest = Digest::from_base64(&encoded).unwrap();

        let segmented = Segment.apply(digest).unwrap();
        assert!(segmented.iter().any(|s| s == "slash"));
        assert_eq!(segmented.last().unwrap(), "equal");
        for s in &segmented {
            assert!(!s.contains('+') && !s.contains('/') && !s.contains('='));
        }

        let recovered = Desegment.apply(segmented).unwrap();
        assert_eq!(recovered, digest);
    }
}
