use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned category identifier.
pub type CategoryId = i64;

/// Whether money flows into or out of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Income,
    Outcome,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Income => write!(f, "Income"),
            Direction::Outcome => write!(f, "Outcome"),
        }
    }
}

/// A spending/income category. Authored by the server; the client only caches it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,

    /// Single-character marker. The server sends a string; only its first
    /// character is kept, so multi-codepoint emoji degrade gracefully.
    #[serde(serialize_with = "serialize_emoji", deserialize_with = "deserialize_emoji")]
    pub emoji: char,

    pub is_income: bool,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>, emoji: char, is_income: bool) -> Self {
        Self {
            id,
            name: name.into(),
            emoji,
            is_income,
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        if self.is_income {
            Direction::Income
        } else {
            Direction::Outcome
        }
    }
}

fn serialize_emoji<S: Serializer>(emoji: &char, serializer: S) -> Result<S::Ok, S::Error> {
    let mut buf = [0u8; 4];
    serializer.serialize_str(emoji.encode_utf8(&mut buf))
}

fn deserialize_emoji<'de, D: Deserializer<'de>>(deserializer: D) -> Result<char, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.chars()
        .next()
        .ok_or_else(|| serde::de::Error::custom("emoji string is empty"))
}
