use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::Script;

use dropgate_state::error::StateError;
use dropgate_state::key::{KeyKind, StateKey};
use dropgate_state::store::{StateStore, StoredValue};

use crate::config::RedisConfig;
use crate::key_render::{kind_prefix, render_key, scan_pattern};
use crate::scripts;

/// Redis-backed implementation of [`StateStore`].
///
/// Uses a `deadpool-redis` connection pool and Lua scripts for atomicity.
/// Entries are stored as Redis hashes with fields `v` (value) and `exp`
/// (expiry, Unix milliseconds). No Redis-native TTL is set; expired entries
/// are removed by [`StateStore::purge_expired`].
pub struct RedisStateStore {
    pool: Pool,
    prefix: String,
}

impl RedisStateStore {
    /// Create a new `RedisStateStore` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, StateError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| StateError::Connection(e.to_string()))?
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
        })
    }

    fn key(&self, key: &StateKey) -> String {
        render_key(&self.prefix, key)
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }

    /// Collect every rendered key of a kind using cursor-based `SCAN`.
    async fn scan_raw_keys(
        &self,
        conn: &mut deadpool_redis::Connection,
        kind: &KeyKind,
    ) -> Result<Vec<String>, StateError> {
        let pattern = scan_pattern(&self.prefix, kind);
        let mut keys = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut *conn)
                .await
                .map_err(|e| StateError::Backend(e.to_string()))?;

            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }

    async fn read_hash(
        conn: &mut deadpool_redis::Connection,
        redis_key: &str,
    ) -> Result<Option<StoredValue>, StateError> {
        let (value, expires_at): (Option<String>, Option<i64>) = redis::cmd("HMGET")
            .arg(redis_key)
            .arg("v")
            .arg("exp")
            .query_async(&mut *conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(match (value, expires_at) {
            (Some(value), Some(expires_at)) => Some(StoredValue { value, expires_at }),
            _ => None,
        })
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, key: &StateKey) -> Result<Option<StoredValue>, StateError> {
        let redis_key = self.key(key);
        let mut conn = self.conn().await?;
        Self::read_hash(&mut conn, &redis_key).await
    }

    async fn put(&self, key: &StateKey, value: &StoredValue) -> Result<(), StateError> {
        let redis_key = self.key(key);
        let mut conn = self.conn().await?;

        redis::cmd("HSET")
            .arg(&redis_key)
            .arg("v")
            .arg(&value.value)
            .arg("exp")
            .arg(value.expires_at)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn raise_expiry(&self, key: &StateKey, expires_at: i64) -> Result<bool, StateError> {
        let redis_key = self.key(key);
        let mut conn = self.conn().await?;

        let written: i64 = Script::new(scripts::RAISE_EXPIRY)
            .key(&redis_key)
            .arg(expires_at)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(written == 1)
    }

    async fn compare_and_delete(
        &self,
        key: &StateKey,
        expected: &StoredValue,
    ) -> Result<bool, StateError> {
        let redis_key = self.key(key);
        let mut conn = self.conn().await?;

        let deleted: i64 = Script::new(scripts::COMPARE_AND_DELETE)
            .key(&redis_key)
            .arg(&expected.value)
            .arg(expected.expires_at)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;

        Ok(deleted == 1)
    }

    async fn scan(&self, kind: &KeyKind) -> Result<Vec<(String, StoredValue)>, StateError> {
        let mut conn = self.conn().await?;
        let keys = self.scan_raw_keys(&mut conn, kind).await?;
        let strip = kind_prefix(&self.prefix, kind);

        let mut results = Vec::with_capacity(keys.len());
        for redis_key in keys {
            // The entry may have been deleted between SCAN and HMGET.
            let Some(value) = Self::read_hash(&mut conn, &redis_key).await? else {
                continue;
            };
            let id = redis_key
                .strip_prefix(&strip)
                .unwrap_or(&redis_key)
                .to_owned();
            results.push((id, value));
        }

        Ok(results)
    }

    async fn purge_expired(&self, kind: &KeyKind, now: i64) -> Result<u64, StateError> {
        let mut conn = self.conn().await?;
        let keys = self.scan_raw_keys(&mut conn, kind).await?;

        let script = Script::new(scripts::PURGE_IF_EXPIRED);
        let mut removed = 0u64;
        for redis_key in keys {
            let deleted: i64 = script
                .key(&redis_key)
                .arg(now)
                .invoke_async(&mut conn)
                .await
                .map_err(|e| StateError::Backend(e.to_string()))?;
            if deleted == 1 {
                removed += 1;
            }
        }

        tracing::debug!(%kind, removed, "redis purge complete");
        Ok(removed)
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;
    use crate::config::RedisConfig;

    fn test_config() -> RedisConfig {
        RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            prefix: format!("dropgate-test-{}", uuid::Uuid::new_v4()),
            ..RedisConfig::default()
        }
    }

    #[tokio::test]
    async fn store_conformance() {
        let config = test_config();
        let store = RedisStateStore::new(&config).expect("pool creation should succeed");
        dropgate_state::testing::run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn concurrent_compare_and_delete_has_one_winner() {
        let config = test_config();
        let store =
            std::sync::Arc::new(RedisStateStore::new(&config).expect("pool creation should succeed"));
        let key = StateKey::new(KeyKind::Token, "contested");
        let value = StoredValue::new("{}", 4_102_444_800);
        store.put(&key, &value).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = std::sync::Arc::clone(&store);
            let key = key.clone();
            let value = value.clone();
            handles.push(tokio::spawn(async move {
                store.compare_and_delete(&key, &value).await.unwrap()
            }));
        }

        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
