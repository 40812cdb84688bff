use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing what a lock manager has done so far.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LockStats {
    /// Calls to `acquire` that returned a token.
    pub acquired: u64,
    /// Calls to `acquire` that gave up at the try timeout.
    pub timed_out: u64,
    /// Polls that found the lock key already taken.
    pub contended_polls: u64,
    /// Un-timed lock records that were given a lease by this manager.
    pub healed: u64,
    /// Store calls that failed (and were retried or ignored).
    pub store_errors: u64,
    /// Releases that deleted the lock key.
    pub released: u64,
    /// Releases that left the key alone because the token did not match.
    pub release_skipped: u64,
}

#[derive(Default)]
pub(crate) struct StatsCollector {
    acquired: AtomicU64,
    timed_out: AtomicU64,
    contended_polls: AtomicU64,
    healed: AtomicU64,
    store_errors: AtomicU64,
    released: AtomicU64,
    release_skipped: AtomicU64,
}

impl StatsCollector {
    pub(crate) fn acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn contended(&self) {
        self.contended_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn healed(&self) {
        self.healed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn release_skipped(&self) {
        self.release_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LockStats {
        LockStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            contended_polls: self.contended_polls.load(Ordering::Relaxed),
            healed: self.healed.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            release_skipped: self.release_skipped.load(Ordering::Relaxed),
        }
    }
}
