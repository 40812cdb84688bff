//! Store - the shared key-value space that coordinates lock holders.
//!
//! The lock manager never keeps lock state in process. Every decision it
//! makes is a round trip through one of the operations below, so any
//! backend offering an atomic set-if-absent plus key expiry can host locks.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 LockManager / AsyncLockManager               │
//! │  acquire(): set_if_absent -> expire | get_expire -> expire   │
//! │  release(): get -> delete                                    │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            KeyValueStore / AsyncKeyValueStore                │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                  │
//!          ▼                                  ▼
//! ┌─────────────────┐              ┌─────────────────────────┐
//! │  InMemoryStore  │              │ RedisStore (`redis`)    │
//! │   (included)    │              │ SET NX / PEXPIRE / PTTL │
//! └─────────────────┘              └─────────────────────────┘
//! ```

mod in_memory;
#[cfg(feature = "redis")]
mod redis_store;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use in_memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

/// Longest expiry a store will arm. Longer requests are clamped to it, so
/// `Duration::MAX` reads as "effectively forever" instead of overflowing.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Time-to-live of a key as reported by the store.
///
/// `NotSet` and `Remaining(Duration::ZERO)` are different answers: the first
/// means the key will live forever, the second that it is about to expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key does not exist.
    Missing,
    /// The key exists but has no expiry.
    NotSet,
    /// The key exists and expires after this much time.
    Remaining(Duration),
}

impl Ttl {
    /// Decode a Redis-style `PTTL` reply (`-2` missing, `-1` no expiry).
    pub fn from_millis_reply(reply: i64) -> Self {
        match reply {
            -1 => Ttl::NotSet,
            r if r < 0 => Ttl::Missing,
            r => Ttl::Remaining(Duration::from_millis(r as u64)),
        }
    }

    pub fn is_not_set(&self) -> bool {
        matches!(self, Ttl::NotSet)
    }
}

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached (connection refused, dropped, timed out).
    Unavailable(String),
    /// The store answered but rejected or failed the command.
    Backend(String),
    /// An in-process store's mutex was poisoned during the named operation.
    Poisoned(&'static str),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
            StoreError::Backend(msg) => write!(f, "store command failed: {}", msg),
            StoreError::Poisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// The key-value operations a lock manager needs from its store.
///
/// `set_if_absent` must be atomic across every client of the store: two
/// concurrent calls for the same absent key may not both return `true`.
/// Everything else about lock safety follows from that one guarantee.
pub trait KeyValueStore: Send + Sync {
    /// Write `value` under `key` only if the key has no live value.
    /// Returns whether the write happened.
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Set or replace the expiry of an existing key.
    /// Returns `false` if the key does not exist.
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Inspect the expiry of a key.
    fn get_expire(&self, key: &str) -> Result<Ttl, StoreError>;

    /// Read the live value of a key.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove a key. Returns whether a live key was removed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).expire(key, ttl)
    }

    fn get_expire(&self, key: &str) -> Result<Ttl, StoreError> {
        (**self).get_expire(key)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).expire(key, ttl)
    }

    fn get_expire(&self, key: &str) -> Result<Ttl, StoreError> {
        (**self).get_expire(key)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key)
    }
}

/// Async counterpart of [`KeyValueStore`], for stores driven from a Tokio runtime.
#[cfg(feature = "tokio")]
#[async_trait::async_trait]
pub trait AsyncKeyValueStore: Send + Sync {
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    async fn get_expire(&self, key: &str) -> Result<Ttl, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

#[cfg(feature = "tokio")]
#[async_trait::async_trait]
impl<S: AsyncKeyValueStore + ?Sized> AsyncKeyValueStore for Arc<S> {
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).expire(key, ttl).await
    }

    async fn get_expire(&self, key: &str) -> Result<Ttl, StoreError> {
        (**self).get_expire(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }
}
