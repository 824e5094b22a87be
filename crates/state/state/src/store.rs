use async_trait::async_trait;

use crate::error::StateError;
use crate::key::{KeyKind, StateKey};

/// A stored value together with its absolute expiry (Unix milliseconds).
///
/// The store never hides an entry because it has expired; expired entries
/// stay visible until [`StateStore::purge_expired`] removes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub expires_at: i64,
}

impl StoredValue {
    /// Create a new stored value.
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: i64) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Returns `true` if the entry is due for removal at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Trait for persisting token and path entries.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Every read-modify-write operation below must be atomic per key.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the entry for a key, expired or not.
    async fn get(&self, key: &StateKey) -> Result<Option<StoredValue>, StateError>;

    /// Insert or overwrite an entry. Last write wins.
    async fn put(&self, key: &StateKey, value: &StoredValue) -> Result<(), StateError>;

    /// Raise the expiry of an entry to `expires_at` if it is absent or lower.
    ///
    /// A missing entry is created with an empty value; an existing entry
    /// keeps its value. Returns `true` if anything was written.
    async fn raise_expiry(&self, key: &StateKey, expires_at: i64) -> Result<bool, StateError>;

    /// Delete an entry only if it still equals `expected` (value and expiry).
    ///
    /// Returns `true` for exactly one caller when several race to remove the
    /// same entry.
    async fn compare_and_delete(
        &self,
        key: &StateKey,
        expected: &StoredValue,
    ) -> Result<bool, StateError>;

    /// Return every entry of the given kind as `(id, value)` pairs.
    ///
    /// This operation may be expensive on some backends. Use sparingly.
    async fn scan(&self, kind: &KeyKind) -> Result<Vec<(String, StoredValue)>, StateError>;

    /// Remove every entry of the given kind whose expiry is `<= now`.
    ///
    /// Each removal re-checks the expiry atomically, so an entry whose expiry
    /// was raised concurrently survives. Returns the number removed.
    async fn purge_expired(&self, kind: &KeyKind, now: i64) -> Result<u64, StateError>;
}
