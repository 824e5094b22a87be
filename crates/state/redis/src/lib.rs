//! Redis state backend for Dropgate.
//!
//! This crate provides a Redis-backed implementation of the [`StateStore`]
//! trait from `dropgate-state`.
//!
//! # Layout
//!
//! Every entry is a Redis hash at `{prefix}:{kind}:{id}` with two fields:
//! `v` (the value) and `exp` (expiry as Unix milliseconds). Token entries and
//! path entries differ only in the `kind` segment.
//!
//! # Atomicity
//!
//! `raise_expiry`, `compare_and_delete` and the per-key step of
//! `purge_expired` run as Lua scripts, so each is atomic on a single Redis
//! instance. Two concurrent redemptions of the same token cannot both
//! succeed.
//!
//! # Example
//!
//! ```ignore
//! use dropgate_state_redis::{RedisConfig, RedisStateStore};
//!
//! let config = RedisConfig {
//!     url: "redis://localhost:6379".into(),
//!     ..RedisConfig::default()
//! };
//! let store = RedisStateStore::new(&config)?;
//! ```
//!
//! [`StateStore`]: dropgate_state::StateStore

mod config;
mod key_render;
mod scripts;
mod store;

pub use config::RedisConfig;
pub use store::RedisStateStore;
