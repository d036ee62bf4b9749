//! Storage error taxonomy.

use super::backend::BackendError;
use std::fmt;
use thiserror::Error;

/// Machine-readable category of a storage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    /// The store is full
    QuotaExceeded,
    /// Access denied by environment policy
    SecurityError,
    /// No store available
    NotSupported,
    /// Anything else, including unreadable data
    UnknownError,
}

impl StorageErrorKind {
    /// Stable code, e.g. `QUOTA_EXCEEDED`
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::SecurityError => "SECURITY_ERROR",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Message suitable for showing to the user
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::QuotaExceeded => {
                "Storage is full. Clear completed tasks to free up space."
            },
            Self::SecurityError => {
                "Storage access was blocked by your browser settings. Changes will not be saved."
            },
            Self::NotSupported => {
                "Storage is not available. Changes will only last until the page is closed."
            },
            Self::UnknownError => "Something went wrong while saving or loading your tasks.",
        }
    }

    /// Whether another attempt could succeed; a full store stays full
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        !matches!(self, Self::QuotaExceeded)
    }
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<&BackendError> for StorageErrorKind {
    fn from(error: &BackendError) -> Self {
        match error {
            BackendError::QuotaExceeded(_) => Self::QuotaExceeded,
            BackendError::AccessDenied(_) => Self::SecurityError,
            BackendError::Unavailable(_) => Self::NotSupported,
            BackendError::Other(message) => {
                let message = message.to_ascii_lowercase();
                if message.contains("quota") {
                    Self::QuotaExceeded
                } else if message.contains("security") || message.contains("denied") {
                    Self::SecurityError
                } else {
                    Self::UnknownError
                }
            },
        }
    }
}

/// A storage failure: a kind plus a user-facing message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StorageError {
    kind: StorageErrorKind,
    message: String,
}

impl StorageError {
    /// Error of `kind` with its standard user message
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            message: kind.user_message().to_string(),
        }
    }

    /// Failure category
    #[must_use]
    pub const fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// User-facing message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&BackendError> for StorageError {
    fn from(error: &BackendError) -> Self {
        Self::new(StorageErrorKind::from(error))
    }
}
