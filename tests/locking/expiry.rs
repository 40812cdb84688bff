//! Leases end on their own, whether or not the holder is finished.

use std::thread;
use std::time::Duration;

use lease_lock::{InMemoryStore, KeyValueStore, LockManager};

// ============================================================================
// Test 1: An expired lease lets a new caller acquire with a new token
// ============================================================================

#[test]
fn expired_lease_is_reclaimed() {
    let locks = LockManager::new(InMemoryStore::new());
    let first = locks
        .acquire("r", Duration::from_millis(50), Duration::from_millis(50))
        .unwrap()
        .unwrap();

    thread::sleep(Duration::from_millis(80));

    let second = locks
        .acquire("r", Duration::from_millis(50), Duration::from_millis(50))
        .unwrap()
        .expect("lease should have expired");
    assert_ne!(first, second);
}

// ============================================================================
// Test 2: A waiter gets the lock once the holder's lease runs out
// ============================================================================

#[test]
fn waiter_outlasts_the_lease() {
    let store = InMemoryStore::new();
    let holder = LockManager::new(store.clone());
    holder
        .acquire("r", Duration::from_millis(100), Duration::from_millis(50))
        .unwrap()
        .unwrap();

    let waiter = LockManager::new(store.clone());
    let token = waiter
        .acquire("r", Duration::from_secs(60), Duration::from_secs(2))
        .unwrap();

    assert!(token.is_some());
    assert!(waiter.stats().contended_polls >= 1);
}

// ============================================================================
// Test 3: Work that outlives its lease overlaps with the next holder
// ============================================================================

#[test]
fn slow_holder_overlaps_with_next_holder() {
    let store = InMemoryStore::new();
    let slow = LockManager::new(store.clone());
    let fast = LockManager::new(store.clone());

    let slow_token = slow
        .acquire("job", Duration::from_millis(50), Duration::from_millis(50))
        .unwrap()
        .unwrap();

    // The slow holder is still "working" when its lease lapses...
    thread::sleep(Duration::from_millis(80));

    // ...so a second holder gets in while the first still thinks it owns the job.
    let fast_token = fast
        .acquire("job", Duration::from_secs(60), Duration::from_millis(50))
        .unwrap()
        .expect("second holder acquires after lease expiry");
    assert_ne!(slow_token, fast_token);

    // The slow holder's late release must not free the new holder's lock.
    assert!(!slow.release("job", &slow_token));
    assert_eq!(
        store.get("lock:job").unwrap().as_deref(),
        Some(fast_token.as_str())
    );
}

// ============================================================================
// Test 4: An unbounded lease leaves the shared store usable for everyone
// ============================================================================

#[test]
fn unbounded_lease_does_not_break_the_store() {
    let store = InMemoryStore::new();
    let holder = LockManager::new(store.clone());
    let token = holder
        .acquire("r", Duration::MAX, Duration::from_millis(50))
        .unwrap()
        .expect("uncontended lock");

    assert!(store.get("other").unwrap().is_none());

    let other = LockManager::new(store.clone());
    assert!(other
        .acquire("other", Duration::from_secs(1), Duration::from_millis(30))
        .unwrap()
        .is_some());
    assert!(other
        .acquire("r", Duration::from_secs(1), Duration::from_millis(30))
        .unwrap()
        .is_none());

    assert!(holder.release("r", &token));
}

// ============================================================================
// Test 5: An unbounded try timeout still returns once the lock is free
// ============================================================================

#[test]
fn unbounded_try_timeout_acquires() {
    let locks = LockManager::new(InMemoryStore::new());
    assert!(locks
        .acquire("r", Duration::from_secs(1), Duration::MAX)
        .unwrap()
        .is_some());
}
