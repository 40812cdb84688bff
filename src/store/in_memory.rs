//! InMemoryStore - HashMap-backed key-value store with lazy key expiry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{KeyValueStore, StoreError, Ttl, MAX_TTL};

/// Internal stored representation of a value.
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-memory key-value store for tests and single-process deployments.
///
/// Expired keys behave exactly like missing ones. They are dropped when next
/// touched, and swept from the whole map whenever a new key is inserted, so
/// locking many distinct resources does not leave dead entries behind. Every operation runs under one
/// mutex, which is what makes `set_if_absent` atomic. Clone-friendly via Arc:
/// clones share the same key space, so handing a clone to each thread
/// models several processes sharing one store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, StoredValue>>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, HashMap<String, StoredValue>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Poisoned(operation))
    }

    /// Look up a live entry, evicting it first if it has expired.
    fn live<'a>(
        entries: &'a mut HashMap<String, StoredValue>,
        key: &str,
        now: Instant,
    ) -> Option<&'a mut StoredValue> {
        if entries.get(key).is_some_and(|stored| !stored.is_live(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    /// Drop every expired entry. Returns how many were removed.
    fn sweep(entries: &mut HashMap<String, StoredValue>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, stored| stored.is_live(now));
        before - entries.len()
    }

    /// Unconditionally write a value, clearing any expiry (like Redis `SET`).
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries("set")?;
        Self::sweep(&mut entries, now);
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries("len")?;
        Self::sweep(&mut entries, now);
        Ok(entries.len())
    }

    /// Remove expired entries now. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries("purge_expired")?;
        Ok(Self::sweep(&mut entries, now))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Remove every key.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.entries("clear")?.clear();
        Ok(())
    }
}

impl KeyValueStore for InMemoryStore {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries("set_if_absent")?;

        if Self::live(&mut entries, key, now).is_some() {
            return Ok(false);
        }

        Self::sweep(&mut entries, now);
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(true)
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl.min(MAX_TTL))
            .ok_or_else(|| StoreError::Backend(format!("expiry {:?} out of range", ttl)))?;
        let mut entries = self.entries("expire")?;

        match Self::live(&mut entries, key, now) {
            Some(stored) => {
                stored.expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_expire(&self, key: &str) -> Result<Ttl, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries("get_expire")?;

        Ok(match Self::live(&mut entries, key, now) {
            Some(StoredValue {
                expires_at: Some(at),
                ..
            }) => Ttl::Remaining(at.saturating_duration_since(now)),
            Some(_) => Ttl::NotSet,
            None => Ttl::Missing,
        })
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries("get")?;

        Ok(Self::live(&mut entries, key, now).map(|stored| stored.value.clone()))
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries("delete")?;

        Ok(entries
            .remove(key)
            .is_some_and(|stored| stored.is_live(now)))
    }
}

#[cfg(feature = "tokio")]
#[async_trait::async_trait]
impl super::AsyncKeyValueStore for InMemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        KeyValueStore::set_if_absent(self, key, value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        KeyValueStore::expire(self, key, ttl)
    }

    async fn get_expire(&self, key: &str) -> Result<Ttl, StoreError> {
        KeyValueStore::get_expire(self, key)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        KeyValueStore::get(self, key)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        KeyValueStore::delete(self, key)
    }
}
