use std::fmt;
use std::time::Duration;

/// Error type for lock operations.
///
/// Only caller mistakes are errors. Failing to get the lock before the try
/// timeout is `Ok(None)`, and store failures while polling are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The resource name was empty.
    InvalidResource,
    /// The lease length was zero.
    InvalidHoldTime(Duration),
    /// The time allowed for acquiring was zero.
    InvalidTryTimeout(Duration),
    /// The configured poll interval was zero.
    InvalidPollInterval(Duration),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::InvalidResource => write!(f, "lock resource name must not be empty"),
            LockError::InvalidHoldTime(d) => {
                write!(f, "lock hold time must be positive, got {:?}", d)
            }
            LockError::InvalidTryTimeout(d) => {
                write!(f, "lock try timeout must be positive, got {:?}", d)
            }
            LockError::InvalidPollInterval(d) => {
                write!(f, "lock poll interval must be positive, got {:?}", d)
            }
        }
    }
}

impl std::error::Error for LockError {}

/// Check `acquire` arguments before touching the store.
pub(crate) fn check_acquire(
    resource: &str,
    hold_time: Duration,
    try_timeout: Duration,
) -> Result<(), LockError> {
    if resource.is_empty() {
        return Err(LockError::InvalidResource);
    }
    if hold_time.is_zero() {
        return Err(LockError::InvalidHoldTime(hold_time));
    }
    if try_timeout.is_zero() {
        return Err(LockError::InvalidTryTimeout(try_timeout));
    }
    Ok(())
}
