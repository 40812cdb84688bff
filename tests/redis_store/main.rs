//! Redis store integration tests (requires `redis` feature).
//!
//! These need a live server and are ignored by default:
//!
//! ```text
//! REDIS_URL=redis://127.0.0.1:6379/ cargo test --features redis -- --ignored
//! ```


use lease_lock::RedisStore;
use uuid::Uuid;

pub fn redis_store() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/".into());
    RedisStore::new(&url).unwrap()
}

/// A key no other test run will touch.
pub fn unique(name: &str) -> String {
    format!("lease-lock-test:{}:{}", name, Uuid::new_v4())
}
