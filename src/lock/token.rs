use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Proof of ownership for one acquisition.
///
/// A lock is held by whoever's token is currently stored under the lock
/// key; the token itself carries no other state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockToken(String);

impl LockToken {
    /// Generate a fresh random (UUID v4) token.
    pub fn generate() -> Self {
        LockToken(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for LockToken {
    fn from(value: String) -> Self {
        LockToken(value)
    }
}

impl From<&str> for LockToken {
    fn from(value: &str) -> Self {
        LockToken(value.to_string())
    }
}

impl AsRef<str> for LockToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
