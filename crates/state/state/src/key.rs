use serde::{Deserialize, Serialize};

use dropgate_core::{PathPrefix, Token};

/// The collection an entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Token store: token -> granted resource and prefix.
    Token,
    /// Path index: prefix -> latest expiry among its tokens.
    Path,
}

impl KeyKind {
    /// Return a string representation of the key kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Token => "token",
            Self::Path => "path",
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key used to address entries in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub kind: KeyKind,
    pub id: String,
}

impl StateKey {
    /// Create a new state key.
    #[must_use]
    pub fn new(kind: KeyKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Key of a token store entry.
    #[must_use]
    pub fn token(token: &Token) -> Self {
        Self::new(KeyKind::Token, token.as_str())
    }

    /// Key of a path index entry.
    #[must_use]
    pub fn path(prefix: &PathPrefix) -> Self {
        Self::new(KeyKind::Path, prefix.as_str())
    }

    /// Return a canonical string representation: `kind:id`
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}
