use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use dropgate_state::error::StateError;
use dropgate_state::key::{KeyKind, StateKey};
use dropgate_state::store::{StateStore, StoredValue};

/// In-memory [`StateStore`] backed by a [`DashMap`].
///
/// Per-key atomicity comes from the shard lock DashMap holds for the
/// duration of each `entry`, `remove_if` and `retain` call. This
/// implementation is fully synchronous internally; the async trait methods
/// return immediately. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    data: DashMap<StateKey, StoredValue>,
}

impl MemoryStateStore {
    /// Create a new, empty in-memory state store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, across all kinds.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &StateKey) -> Result<Option<StoredValue>, StateError> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &StateKey, value: &StoredValue) -> Result<(), StateError> {
        self.data.insert(key.clone(), value.clone());
        Ok(())
    }

    async fn raise_expiry(&self, key: &StateKey, expires_at: i64) -> Result<bool, StateError> {
        let written = match self.data.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().expires_at < expires_at {
                    occupied.get_mut().expires_at = expires_at;
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new("", expires_at));
                true
            }
        };
        Ok(written)
    }

    async fn compare_and_delete(
        &self,
        key: &StateKey,
        expected: &StoredValue,
    ) -> Result<bool, StateError> {
        Ok(self
            .data
            .remove_if(key, |_, current| current == expected)
            .is_some())
    }

    async fn scan(&self, kind: &KeyKind) -> Result<Vec<(String, StoredValue)>, StateError> {
        Ok(self
            .data
            .iter()
            .filter(|entry| &entry.key().kind == kind)
            .map(|entry| (entry.key().id.clone(), entry.value().clone()))
            .collect())
    }

    async fn purge_expired(&self, kind: &KeyKind, now: i64) -> Result<u64, StateError> {
        let mut removed = 0u64;
        self.data.retain(|key, value| {
            let expired = &key.kind == kind && value.is_expired_at(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        Ok(removed)
    }
}
