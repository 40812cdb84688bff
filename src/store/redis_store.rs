//! Redis-backed store.
//!
//! Maps each store operation onto a single Redis command, so the atomicity
//! the lock relies on is Redis' own: `SET key value NX` is the set-if-absent.
//!
//! ## Example
//!
//! ```ignore
//! use lease_lock::{LockManager, RedisStore};
//! use std::time::Duration;
//!
//! let store = RedisStore::new("redis://127.0.0.1:6379/")?;
//! let locks = LockManager::new(store);
//! if let Some(token) = locks.acquire("task", Duration::from_secs(1), Duration::from_secs(5))? {
//!     // critical section
//!     locks.release("task", &token);
//! }
//! ```

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use redis::{Client, Connection, RedisError};

use super::{KeyValueStore, StoreError, Ttl, MAX_TTL};

/// Redis store holding one lazily (re)opened connection.
///
/// A connection that fails with an I/O error is dropped and reopened on the
/// next call, so a manager polling through a Redis restart recovers on its
/// own once the server is back.
pub struct RedisStore {
    client: Client,
    connection: Mutex<Option<Connection>>,
}

impl RedisStore {
    /// Create a store from a connection URL (e.g. `redis://localhost:6379/0`).
    ///
    /// Only the URL is validated here; the first connection is opened on
    /// first use.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    /// Create a store from host and port.
    pub fn with_host_port(host: &str, port: u16) -> Result<Self, StoreError> {
        Self::new(&format!("redis://{}:{}/", host, port))
    }

    fn connection(&self) -> Result<MutexGuard<'_, Option<Connection>>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Poisoned("redis connection"))
    }

    fn run<T>(
        &self,
        command: &'static str,
        f: impl FnOnce(&mut Connection) -> redis::RedisResult<T>,
    ) -> Result<T, StoreError> {
        let mut slot = self.connection()?;

        if slot.is_none() {
            let opened = self.client.get_connection().map_err(classify)?;
            *slot = Some(opened);
        }

        let result = match slot.as_mut() {
            Some(conn) => f(conn),
            None => return Err(StoreError::Unavailable("no redis connection".into())),
        };

        result.map_err(|e| {
            let err = classify(e);
            if matches!(err, StoreError::Unavailable(_)) {
                *slot = None;
            }
            tracing::debug!(command, error = %err, "redis command failed");
            err
        })
    }
}

fn classify(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

fn millis(ttl: Duration) -> u64 {
    // PEXPIRE 0 deletes the key instead of arming a timer.
    u64::try_from(ttl.min(MAX_TTL).as_millis())
        .unwrap_or(i64::MAX as u64)
        .max(1)
}

impl KeyValueStore for RedisStore {
    fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let reply: Option<String> = self.run("SET NX", |conn| {
            redis::cmd("SET").arg(key).arg(value).arg("NX").query(conn)
        })?;
        Ok(reply.is_some())
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let updated: i64 = self.run("PEXPIRE", |conn| {
            redis::cmd("PEXPIRE").arg(key).arg(millis(ttl)).query(conn)
        })?;
        Ok(updated == 1)
    }

    fn get_expire(&self, key: &str) -> Result<Ttl, StoreError> {
        let reply: i64 = self.run("PTTL", |conn| redis::cmd("PTTL").arg(key).query(conn))?;
        Ok(Ttl::from_millis_reply(reply))
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.run("GET", |conn| redis::cmd("GET").arg(key).query(conn))
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let removed: i64 = self.run("DEL", |conn| redis::cmd("DEL").arg(key).query(conn))?;
        Ok(removed > 0)
    }
}
