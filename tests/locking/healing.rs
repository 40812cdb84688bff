//! Lock records without a lease get one from the next contender.

use std::thread;
use std::time::Duration;

use lease_lock::{InMemoryStore, KeyValueStore, LockManager, Ttl};

use crate::support::FlakyStore;

// ============================================================================
// Test 1: A contender stamps a lease but does not take ownership
// ============================================================================

#[test]
fn contender_heals_untimed_record_without_owning_it() {
    let store = InMemoryStore::new();
    // A holder that died between set_if_absent and expire.
    store.set("lock:task", "dead-holder").unwrap();
    assert_eq!(store.get_expire("lock:task").unwrap(), Ttl::NotSet);

    let locks = LockManager::new(store.clone());
    let result = locks
        .acquire("task", Duration::from_secs(60), Duration::from_millis(50))
        .unwrap();

    assert!(result.is_none());
    assert_eq!(
        store.get("lock:task").unwrap().as_deref(),
        Some("dead-holder")
    );
    match store.get_expire("lock:task").unwrap() {
        Ttl::Remaining(left) => assert!(left > Duration::from_secs(50)),
        other => panic!("expected a lease, got {:?}", other),
    }
    assert_eq!(locks.stats().healed, 1);
}

// ============================================================================
// Test 2: An existing lease is not re-stamped by contenders
// ============================================================================

#[test]
fn timed_record_keeps_its_lease() {
    let store = InMemoryStore::new();
    let holder = LockManager::new(store.clone());
    holder
        .acquire("task", Duration::from_millis(400), Duration::from_millis(50))
        .unwrap()
        .unwrap();

    let contender = LockManager::new(store.clone());
    contender
        .acquire("task", Duration::from_secs(60), Duration::from_millis(100))
        .unwrap();

    match store.get_expire("lock:task").unwrap() {
        Ttl::Remaining(left) => assert!(left <= Duration::from_millis(400)),
        other => panic!("expected the holder's lease, got {:?}", other),
    }
    assert_eq!(contender.stats().healed, 0);
}

// ============================================================================
// Test 3: A healed record expires and the resource becomes free again
// ============================================================================

#[test]
fn healed_record_eventually_frees_the_resource() {
    let store = InMemoryStore::new();
    store.set("lock:task", "dead-holder").unwrap();

    let locks = LockManager::new(store.clone());
    assert!(locks
        .acquire("task", Duration::from_millis(80), Duration::from_millis(30))
        .unwrap()
        .is_none());

    thread::sleep(Duration::from_millis(120));

    let token = locks
        .acquire("task", Duration::from_secs(60), Duration::from_millis(50))
        .unwrap()
        .expect("lock should be free once the healed lease lapses");
    assert_eq!(
        store.get("lock:task").unwrap().as_deref(),
        Some(token.as_str())
    );
}

// ============================================================================
// Test 4: Crash between claim and expire is recovered by the next poll
// ============================================================================

#[test]
fn failed_expire_after_claim_is_healed() {
    let flaky = FlakyStore::new(InMemoryStore::new());
    flaky.fail_next_expires(1);

    let locks = LockManager::new(flaky.clone());
    // The claim succeeds but its expire fails: the attempt counts as failed
    // and the record is left without a lease until the next poll heals it.
    let result = locks
        .acquire("task", Duration::from_millis(60), Duration::from_millis(40))
        .unwrap();
    assert!(result.is_none());

    let stats = locks.stats();
    assert_eq!(stats.store_errors, 1);
    assert_eq!(stats.healed, 1);
    assert!(matches!(
        flaky.inner.get_expire("lock:task").unwrap(),
        Ttl::Remaining(_)
    ));

    thread::sleep(Duration::from_millis(100));
    assert!(locks
        .acquire("task", Duration::from_secs(60), Duration::from_millis(50))
        .unwrap()
        .is_some());
}
