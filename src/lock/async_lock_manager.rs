use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::error::check_acquire;
use super::lock_manager::{finish_release, owns_lock};
use super::stats::StatsCollector;
use super::{LockError, LockOptions, LockStats, LockToken};
use crate::store::{AsyncKeyValueStore, StoreError};

/// Async lock manager over a shared [`AsyncKeyValueStore`].
///
/// Same contract as [`LockManager`](super::LockManager); waiting between
/// polls is a Tokio timer instead of a blocked thread.
///
/// ## Example
///
/// ```
/// use lease_lock::{AsyncLockManager, InMemoryStore};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let locks = AsyncLockManager::new(InMemoryStore::new());
/// let token = locks
///     .acquire("report", Duration::from_secs(30), Duration::from_secs(1))
///     .await
///     .unwrap()
///     .expect("uncontended lock");
/// assert!(locks.release("report", &token).await);
/// # }
/// ```
pub struct AsyncLockManager<S> {
    store: S,
    options: LockOptions,
    stats: StatsCollector,
}

impl<S: AsyncKeyValueStore> AsyncLockManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            options: LockOptions::default(),
            stats: StatsCollector::default(),
        }
    }

    pub fn try_with_options(store: S, options: LockOptions) -> Result<Self, LockError> {
        options.validate()?;
        Ok(Self {
            store,
            options,
            stats: StatsCollector::default(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    pub fn lock_key(&self, resource: &str) -> String {
        self.options.lock_key(resource)
    }

    pub fn stats(&self) -> LockStats {
        self.stats.snapshot()
    }

    /// See [`LockManager::acquire`](super::LockManager::acquire).
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn acquire(
        &self,
        resource: &str,
        hold_time: Duration,
        try_timeout: Duration,
    ) -> Result<Option<LockToken>, LockError> {
        check_acquire(resource, hold_time, try_timeout)?;

        let lock_key = self.lock_key(resource);
        let token = LockToken::generate();
        // A timeout too large to represent as an Instant means "no deadline".
        let deadline = Instant::now().checked_add(try_timeout);

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            match self.attempt(&lock_key, &token, hold_time).await {
                Ok(true) => {
                    self.stats.acquired();
                    debug!(%lock_key, %token, "lock acquired");
                    return Ok(Some(token));
                }
                Ok(false) => self.stats.contended(),
                Err(error) => {
                    self.stats.store_error();
                    warn!(%lock_key, %error, "store error while acquiring lock, retrying");
                }
            }

            let mut pause = self.options.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                pause = pause.min(deadline - now);
            }
            sleep(pause).await;
        }

        self.stats.timed_out();
        debug!(%lock_key, ?try_timeout, "gave up acquiring lock");
        Ok(None)
    }

    async fn attempt(
        &self,
        lock_key: &str,
        token: &LockToken,
        hold_time: Duration,
    ) -> Result<bool, StoreError> {
        if self.store.set_if_absent(lock_key, token.as_str()).await? {
            self.store.expire(lock_key, hold_time).await?;
            return Ok(true);
        }

        if self.store.get_expire(lock_key).await?.is_not_set()
            && self.store.expire(lock_key, hold_time).await?
        {
            self.stats.healed();
            info!(%lock_key, ?hold_time, "lock record had no expiry, lease applied");
        }

        Ok(false)
    }

    /// See [`LockManager::release`](super::LockManager::release).
    #[tracing::instrument(level = "debug", skip(self, token), fields(token = %token))]
    pub async fn release(&self, resource: &str, token: &LockToken) -> bool {
        if resource.is_empty() {
            warn!("release called with an empty resource name");
            return false;
        }

        let lock_key = self.lock_key(resource);
        let current = self.store.get(&lock_key).await;
        if !owns_lock(&self.stats, &lock_key, token, current) {
            return false;
        }

        let deleted = self.store.delete(&lock_key).await;
        finish_release(&self.stats, &lock_key, deleted)
    }

    /// Run the future built by `f` while holding the lock on `resource`.
    ///
    /// The lock is released after the future completes. If the future panics
    /// or is dropped early, the lease is left to expire on its own.
    pub async fn with_lock<R, F, Fut>(
        &self,
        resource: &str,
        hold_time: Duration,
        try_timeout: Duration,
        f: F,
    ) -> Result<Option<R>, LockError>
    where
        F: FnOnce(LockToken) -> Fut,
        Fut: Future<Output = R>,
    {
        let Some(token) = self.acquire(resource, hold_time, try_timeout).await? else {
            return Ok(None);
        };

        let out = f(token.clone()).await;
        self.release(resource, &token).await;
        Ok(Some(out))
    }
}
