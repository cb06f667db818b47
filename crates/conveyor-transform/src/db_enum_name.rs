//! `key -> key + "__" + postfix` and its inverse, used to derive enum table
//! name suffixes from a metadata key.

use crate::{Error, Transform};

#[derive(Clone, Debug)]
pub struct DbEnumName {
    pub postfix: String,
}

#[derive(Clone, Debug)]
pub struct UndoDbEnumName {
    pub postfix: String,
}

impl DbEnumName {
    pub fn new(postfix: impl Into<String>) -> Self {
        DbEnumName {
            postfix: postfix.into(),
        }
    }
}

impl Transform<String, String> for DbEnumName {
    type Inverse = UndoDbEnumName;

    fn apply(&self, key: String) -> Result<String, Error> {
        Ok(format!("{key}__{}", self.postfix))
    }

    fn invert(&self) -> UndoDbEnumName {
        UndoDbEnumName {
            postfix: self.postfix.clone(),
        }
    }
}

impl Transform<String, String> for UndoDbEnumName {
    type Inverse = DbEnumName;

    fn apply(&self, name: String) -> Result<String, Error> {
        let suffix = format!("__{}", self.postfix);
        name.strip_suffix(suffix.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Trusted(format!("`{name}` does not end with `{suffix}`")))
    }

    fn invert(&self) -> DbEnumName {
        DbEnumName {
            postfix: self.postfix.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let t = DbEnumName::new("kind");
        let applied = t.apply("status".to_string()).unwrap();
        assert_eq!(applied, "status__kind");
        assert_eq!(t.invert().apply(applied).unwrap(), "status");
    }
}
