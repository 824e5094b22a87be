use std::sync::Arc;

use dropgate_state::StateStore;
use dropgate_state_memory::MemoryStateStore;
#[cfg(feature = "redis")]
use dropgate_state_redis::{RedisConfig, RedisStateStore};

use crate::config::StateConfig;
use crate::error::ServerError;

/// Construct a `StateStore` from configuration.
pub fn create_state(config: &StateConfig) -> Result<Arc<dyn StateStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStateStore::new())),
        #[cfg(feature = "redis")]
        "redis" => create_redis(config),
        other => Err(ServerError::Config(format!(
            "unsupported state backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "redis")]
fn create_redis(config: &StateConfig) -> Result<Arc<dyn StateStore>, ServerError> {
    let url = config.url.as_deref().unwrap_or("redis://127.0.0.1:6379");
    let redis_config = RedisConfig {
        url: url.to_owned(),
        prefix: config
            .prefix
            .clone()
            .unwrap_or_else(|| "dropgate".to_owned()),
        ..RedisConfig::default()
    };
    let store = RedisStateStore::new(&redis_config)
        .map_err(|e| ServerError::Config(format!("redis store: {e}")))?;
    Ok(Arc::new(store))
}
