//! Lease-based distributed locks over a shared key-value store.
//!
//! Independent processes coordinate through nothing but the store: a lock
//! is a key written with set-if-absent, given a time-to-live, and deleted by
//! its owner on release.
//!
//! ## Example
//!
//! ```
//! use lease_lock::{InMemoryStore, LockManager};
//! use std::time::Duration;
//!
//! let locks = LockManager::new(InMemoryStore::new());
//!
//! let counted = locks
//!     .with_lock("counter", Duration::from_secs(5), Duration::from_secs(1), |_token| {
//!         // only one holder at a time gets here
//!         1 + 1
//!     })
//!     .unwrap();
//!
//! assert_eq!(counted, Some(2));
//! ```
//!
//! ## Features
//!
//! - `redis` - `RedisStore`, backed by `SET NX` / `PEXPIRE` / `PTTL`
//! - `tokio` - `AsyncKeyValueStore` and `AsyncLockManager`

mod lock;
pub mod store;

pub use lock::{
    LockError, LockManager, LockOptions, LockStats, LockToken, DEFAULT_KEY_PREFIX,
    DEFAULT_POLL_INTERVAL,
};
#[cfg(feature = "tokio")]
pub use lock::AsyncLockManager;
pub use store::{InMemoryStore, KeyValueStore, StoreError, Ttl, MAX_TTL};
#[cfg(feature = "redis")]
pub use store::RedisStore;
#[cfg(feature = "tokio")]
pub use store::AsyncKeyValueStore;
