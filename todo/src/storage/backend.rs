//! The key-value store abstraction behind [`super::TodoStorage`].

use thiserror::Error;

/// Raw failure reported by a key-value store
///
/// The message is for logs only; it is never shown to end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The store is full
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The environment denied access to the store
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The store is not available at all
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// A synchronous, string-keyed, string-valued store
///
/// Modeled on browser session storage: writes either fully succeed or fail,
/// and each key holds one complete value.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the write is rejected.
    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Remove `key`; removing a missing key succeeds
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the store cannot be modified.
    fn remove_item(&self, key: &str) -> Result<(), BackendError>;

    /// Bytes currently used, if the store can tell
    fn used_bytes(&self) -> Option<usize> {
        None
    }

    /// Total bytes available, if the store has a known quota
    fn quota_bytes(&self) -> Option<usize> {
        None
    }
}
