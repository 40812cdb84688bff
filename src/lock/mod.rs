//! Lock - lease-based mutual exclusion over a shared key-value store.
//!
//! ```text
//!          acquire: set_if_absent + expire
//!   FREE ─────────────────────────────────────▶ HELD(token, lease)
//!    ▲                                              │
//!    └──────────────────────────────────────────────┘
//!        lease expires in the store, or release(token)
//! ```
//!
//! A record with no expiry is never a resting state: it is either about to
//! get its lease from the acquirer that created it, or it gets one from the
//! next contender that polls it.
//!
//! - `LockManager` - blocking manager, polls with `thread::sleep`
//! - `AsyncLockManager` - Tokio manager (requires `tokio` feature)
//! - `LockToken` - per-acquisition ownership proof
//! - `LockOptions` - key prefix and poll interval

#[cfg(feature = "tokio")]
mod async_lock_manager;
mod error;
mod lock_manager;
mod options;
mod stats;
mod token;

#[cfg(feature = "tokio")]
pub use async_lock_manager::AsyncLockManager;
pub use error::LockError;
pub use lock_manager::LockManager;
pub use options::{LockOptions, DEFAULT_KEY_PREFIX, DEFAULT_POLL_INTERVAL};
pub use stats::LockStats;
pub use token::LockToken;
