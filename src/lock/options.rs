use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::LockError;

/// Prefix joined to a resource name to form its lock key.
pub const DEFAULT_KEY_PREFIX: &str = "lock:";

/// Pause between acquisition attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Settings shared by `LockManager` and `AsyncLockManager`.
///
/// Deserializable so it can sit inside a host application's config:
///
/// ```
/// use lease_lock::LockOptions;
/// use std::time::Duration;
///
/// let opts: LockOptions = serde_json::from_str(r#"{ "poll_interval_ms": 25 }"#).unwrap();
/// assert_eq!(opts.poll_interval, Duration::from_millis(25));
/// assert_eq!(opts.key_prefix, "lock:");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    pub key_prefix: String,
    #[serde(
        rename = "poll_interval_ms",
        serialize_with = "serialize_millis",
        deserialize_with = "deserialize_millis"
    )]
    pub poll_interval: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl LockOptions {
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<(), LockError> {
        if self.poll_interval.is_zero() {
            return Err(LockError::InvalidPollInterval(self.poll_interval));
        }
        Ok(())
    }

    /// The store key for `resource`.
    pub fn lock_key(&self, resource: &str) -> String {
        format!("{}{}", self.key_prefix, resource)
    }
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

fn deserialize_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    u64::deserialize(d).map(Duration::from_millis)
}
