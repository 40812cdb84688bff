//! Lock manager integration tests.
//!
//! Each test shares one store between several managers and threads, the
//! way independent processes share one Redis:
//! - Mutual exclusion under contention
//! - Healing of lock records that never got a lease
//! - Token-gated release
//! - Lease expiry, including the overlapping-holders failure mode
//! - Transient store failures while polling

mod expiry;
mod healing;
