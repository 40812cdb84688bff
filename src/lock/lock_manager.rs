use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::error::check_acquire;
use super::stats::StatsCollector;
use super::{LockError, LockOptions, LockStats, LockToken};
use crate::store::{KeyValueStore, StoreError};

/// Blocking lock manager over a shared [`KeyValueStore`].
///
/// Holds no lock state of its own: a lock exists while the store maps
/// `key_prefix + resource` to some token, and belongs to whoever generated
/// that token. Any number of managers, in any number of processes, can point
/// at the same store.
///
/// Leases are fixed at acquisition time and never renewed. Work that outlives
/// `hold_time` can run concurrently with the next holder of the same resource.
///
/// ## Example
///
/// ```
/// use lease_lock::{InMemoryStore, LockManager};
/// use std::time::Duration;
///
/// let locks = LockManager::new(InMemoryStore::new());
///
/// let token = locks
///     .acquire("report", Duration::from_secs(30), Duration::from_secs(1))
///     .unwrap()
///     .expect("uncontended lock");
///
/// // ... exclusive work ...
///
/// assert!(locks.release("report", &token));
/// ```
pub struct LockManager<S> {
    store: S,
    options: LockOptions,
    stats: StatsCollector,
}

impl<S: KeyValueStore> LockManager<S> {
    /// Create a manager with default options (`lock:` prefix, 10ms polling).
    pub fn new(store: S) -> Self {
        Self {
            store,
            options: LockOptions::default(),
            stats: StatsCollector::default(),
        }
    }

    /// Create a manager with custom options.
    pub fn try_with_options(store: S, options: LockOptions) -> Result<Self, LockError> {
        options.validate()?;
        Ok(Self {
            store,
            options,
            stats: StatsCollector::default(),
        })
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &LockOptions {
        &self.options
    }

    /// The store key backing `resource`.
    pub fn lock_key(&self, resource: &str) -> String {
        self.options.lock_key(resource)
    }

    pub fn stats(&self) -> LockStats {
        self.stats.snapshot()
    }

    /// Try to take the lock on `resource` for `hold_time`, polling for up to
    /// `try_timeout`.
    ///
    /// Returns `Ok(None)` when the deadline passes without success. Store
    /// errors count as a failed poll and are retried until the deadline.
    /// Only invalid arguments return `Err`, and they do so before any store
    /// call is made.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn acquire(
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
            match self.attempt(&lock_key, &token, hold_time) {
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
            thread::sleep(pause);
        }

        self.stats.timed_out();
        debug!(%lock_key, ?try_timeout, "gave up acquiring lock");
        Ok(None)
    }

    /// One poll: claim the key, or give a lease to an un-timed record left
    /// behind by a holder that died between its claim and its expire.
    fn attempt(
        &self,
        lock_key: &str,
        token: &LockToken,
        hold_time: Duration,
    ) -> Result<bool, StoreError> {
        if self.store.set_if_absent(lock_key, token.as_str())? {
            self.store.expire(lock_key, hold_time)?;
            return Ok(true);
        }

        if self.store.get_expire(lock_key)?.is_not_set() && self.store.expire(lock_key, hold_time)? {
            self.stats.healed();
            info!(%lock_key, ?hold_time, "lock record had no expiry, lease applied");
        }

        Ok(false)
    }

    /// Release the lock on `resource` if `token` still owns it.
    ///
    /// Returns whether the lock key was deleted. A token that no longer
    /// matches (the lease lapsed, or someone else holds the lock now) leaves
    /// the key untouched. Never fails: store errors are logged and reported
    /// as `false`, and the lease will reclaim the lock regardless.
    ///
    /// The ownership check and the delete are two separate store calls. If
    /// the lease lapses and another caller acquires in between, that
    /// caller's lock is deleted.
    #[tracing::instrument(level = "debug", skip(self, token), fields(token = %token))]
    pub fn release(&self, resource: &str, token: &LockToken) -> bool {
        if resource.is_empty() {
            warn!("release called with an empty resource name");
            return false;
        }

        let lock_key = self.lock_key(resource);
        let current = self.store.get(&lock_key);
        if !owns_lock(&self.stats, &lock_key, token, current) {
            return false;
        }

        let deleted = self.store.delete(&lock_key);
        finish_release(&self.stats, &lock_key, deleted)
    }

    /// Run `f` while holding the lock on `resource`.
    ///
    /// Returns `Ok(None)` without calling `f` if the lock could not be taken
    /// within `try_timeout`. The lock is released once `f` returns or panics.
    pub fn with_lock<R>(
        &self,
        resource: &str,
        hold_time: Duration,
        try_timeout: Duration,
        f: impl FnOnce(&LockToken) -> R,
    ) -> Result<Option<R>, LockError> {
        let Some(token) = self.acquire(resource, hold_time, try_timeout)? else {
            return Ok(None);
        };

        let held = HeldLock {
            manager: self,
            resource,
            token,
        };
        Ok(Some(f(&held.token)))
    }
}

/// Releases its lock when dropped, including during unwinding.
struct HeldLock<'a, S: KeyValueStore> {
    manager: &'a LockManager<S>,
    resource: &'a str,
    token: LockToken,
}

impl<S: KeyValueStore> Drop for HeldLock<'_, S> {
    fn drop(&mut self) {
        self.manager.release(self.resource, &self.token);
    }
}

/// Decide from the owner read whether `token` may delete the lock key.
pub(super) fn owns_lock(
    stats: &StatsCollector,
    lock_key: &str,
    token: &LockToken,
    current: Result<Option<String>, StoreError>,
) -> bool {
    match current {
        Ok(Some(owner)) if owner == token.as_str() => true,
        Ok(Some(_)) => {
            stats.release_skipped();
            warn!(%lock_key, "lock is held by another token, not releasing");
            false
        }
        Ok(None) => {
            stats.release_skipped();
            debug!(%lock_key, "lock already released or expired");
            false
        }
        Err(error) => {
            stats.store_error();
            warn!(%lock_key, %error, "store error while reading lock owner");
            false
        }
    }
}

/// Record the outcome of the delete that ends a release.
pub(super) fn finish_release(
    stats: &StatsCollector,
    lock_key: &str,
    deleted: Result<bool, StoreError>,
) -> bool {
    match deleted {
        Ok(_) => {
            stats.released();
            debug!(%lock_key, "lock released");
            true
        }
        Err(error) => {
            stats.store_error();
            warn!(%lock_key, %error, "store error while deleting lock");
            false
        }
    }
}
