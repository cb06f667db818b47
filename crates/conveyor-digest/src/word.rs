use std::fmt;

/// A non-empty string matching `\w+`. Used wherever a name is a token:
/// item kinds, statuses, and metadata keys.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word(String);

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a valid word (must match `\\w+`)")]
pub struct InvalidWord(String);

impl Word {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidWord> {
        let value = value.into();
        if value.is_empty() || !value.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(InvalidWord(value));
        }
        Ok(Word(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:?})", self.0)
    }
}

impl std::str::FromStr for Word {
    type Err = InvalidWord;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Word::new(s)
    }
}

impl TryFrom<String> for Word {
    type Error = InvalidWord;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Word::new(value)
    }
}

impl From<Word> for String {
    fn from(w: Word) -> Self {
        w.0
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_punctuation() {
        assert!(Word::new("").is_err());
        assert!(Word::new("not word!").is_err());
    }

    #[test]
    fn accepts_word_characters() {
        assert!(Word::new("kind_1").is_ok());
        assert!(Word::new("abc123").is_ok());
    }
}
