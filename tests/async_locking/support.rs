//! Fault-injecting async store wrapper.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lease_lock::{AsyncKeyValueStore, InMemoryStore, StoreError, Ttl};

/// Async store that fails a configurable number of calls before delegating.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    failing_calls: Arc<AtomicUsize>,
    failing_expires: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    /// Make the next `n` store calls of any kind fail.
    pub fn fail_next(&self, n: usize) {
        self.failing_calls.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` `expire` calls fail.
    pub fn fail_next_expires(&self, n: usize) {
        self.failing_expires.store(n, Ordering::SeqCst);
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check(&self) -> Result<(), StoreError> {
        if Self::take(&self.failing_calls) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncKeyValueStore for FlakyStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.set_if_absent(key, value).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.check()?;
        if Self::take(&self.failing_expires) {
            return Err(StoreError::Unavailable("injected expire failure".into()));
        }
        self.inner.expire(key, ttl).await
    }

    async fn get_expire(&self, key: &str) -> Result<Ttl, StoreError> {
        self.check()?;
        self.inner.get_expire(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.delete(key).await
    }
}
