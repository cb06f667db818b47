use std::collections::BTreeMap;

use conveyor_digest::Word;

use crate::Error;

/// Field names reserved for the fixed row columns; a metadata key must not
/// collide with any of these.
pub const RESERVED_KEYS: [&str; 5] = ["status", "digest", "chain", "created", "reserver"];

/// A string-valued metadata entry eligible for low-cardinality interning by
/// the enum cache.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Enumerable(pub String);

impl Enumerable {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Enumerable {
    fn from(s: &str) -> Self {
        Enumerable(s.to_string())
    }
}

impl From<String> for Enumerable {
    fn from(s: String) -> Self {
        Enumerable(s)
    }
}

/// A metadata value: a string, a 64-bit integer, a 64-bit float, a
/// timezone-less timestamp, or a wrapped [`Enumerable`] string destined for
/// interning.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Timestamp(chrono::NaiveDateTime),
    Enumerable(Enumerable),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}
impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}
impl From<Enumerable> for Value {
    fn from(v: Enumerable) -> Self {
        Value::Enumerable(v)
    }
}

/// An unordered mapping from [`Word`] keys to [`Value`]s. The empty string
/// and an absent value are both legal values; only the key set is
/// constrained (must not collide with [`RESERVED_KEYS`]).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata(BTreeMap<Word, Value>);

impl Metadata {
    pub fn new() -> Self {
        Metadata(BTreeMap::new())
    }

    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Word, Value)>,
    ) -> Result<Self, Error> {
        let mut map = BTreeMap::new();
        for (key, value) in pairs {
            if RESERVED_KEYS.contains(&key.as_str()) {
                return Err(Error::ReservedKey(key.as_str().to_string()));
            }
            map.insert(key, value);
        }
        Ok(Metadata(map))
    }

    pub fn get(&self, key: &Word) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Word, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Word> {
        self.0.keys()
    }
}

impl FromIterator<(Word, Value)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (Word, Value)>>(iter: T) -> Self {
        Metadata(BTreeMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_reserved_keys() {
        let key = Word::new("status").unwrap();
        let err = Metadata::from_pairs([(key, Value::String("x".into()))]).unwrap_err();
        assert!(matches!(err, Error::ReservedKey(_)));
    }

    #[test]
    fn accepts_ordinary_keys() {
        let key = Word::new("color").unwrap();
        let md = Metadata::from_pairs([(key, Value::String("red".into()))]).unwrap();
        assert_eq!(md.len(), 1);
    }
}
