//! Persistence of todos and preferences in a session-scoped key-value store.
//!
//! [`TodoStorage`] is constructed once at startup and handed to whatever
//! needs it; there is no global instance. Writes are full snapshots, so a
//! later save simply replaces an earlier one.
//!
//! Failures are reported as [`StorageError`] values carrying a
//! [`StorageErrorKind`] and a user-facing message. The raw backend error is
//! logged and otherwise dropped.

mod backend;
mod error;
mod session;

pub use backend::{BackendError, KeyValueStore};
pub use error::{StorageError, StorageErrorKind};
pub use session::SessionStorage;

use crate::config::StorageConfig;
use crate::types::{Preferences, Todo};
use crate::validation::validate_text;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Key holding the JSON array of todos
pub const TODOS_KEY: &str = "tabtodo:todos";

/// Key holding the JSON preferences object
pub const PREFERENCES_KEY: &str = "tabtodo:preferences";

const PROBE_KEY: &str = "tabtodo:__probe__";

/// Advisory report on the state of the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageInfo {
    /// Whether the store passed support detection
    pub supported: bool,
    /// Bytes in use, when the store reports it
    pub used_bytes: Option<usize>,
    /// Byte quota, when the store reports it
    pub quota_bytes: Option<usize>,
    /// Usage is at or above the configured near-capacity ratio
    pub near_capacity: bool,
}

impl StorageInfo {
    /// Fraction of the quota in use, when both numbers are known
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // advisory figure
    pub fn usage_ratio(&self) -> Option<f64> {
        match (self.used_bytes, self.quota_bytes) {
            (Some(used), Some(quota)) if quota > 0 => Some(used as f64 / quota as f64),
            _ => None,
        }
    }
}

/// Todo and preference persistence over a [`KeyValueStore`]
pub struct TodoStorage {
    backend: Option<Arc<dyn KeyValueStore>>,
    config: StorageConfig,
}

impl std::fmt::Debug for TodoStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStorage")
            .field("supported", &self.is_supported())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TodoStorage {
    /// Wraps `backend`, probing it with a write/read/delete cycle
    ///
    /// A backend that fails the probe is treated as absent.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>, config: StorageConfig) -> Self {
        let supported = Self::probe(backend.as_ref());
        if !supported {
            tracing::warn!("Key-value store failed support detection; persistence disabled");
        }
        Self {
            backend: supported.then_some(backend),
            config,
        }
    }

    /// Storage for an environment without any key-value store
    #[must_use]
    pub const fn unavailable(config: StorageConfig) -> Self {
        Self {
            backend: None,
            config,
        }
    }

    fn probe(backend: &dyn KeyValueStore) -> bool {
        let cycle = || -> Result<bool, BackendError> {
            backend.set_item(PROBE_KEY, PROBE_KEY)?;
            let read = backend.get_item(PROBE_KEY)?;
            backend.remove_item(PROBE_KEY)?;
            Ok(read.as_deref() == Some(PROBE_KEY))
        };

        match cycle() {
            Ok(ok) => ok,
            Err(error) => {
                tracing::debug!(%error, "Storage probe failed");
                false
            },
        }
    }

    /// Whether the store passed support detection
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Result<&dyn KeyValueStore, StorageError> {
        self.backend
            .as_deref()
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotSupported))
    }

    /// Saves the full todo list
    ///
    /// # Errors
    ///
    /// Returns the classified failure once retries are exhausted, or at once
    /// for `QUOTA_EXCEEDED` and `NOT_SUPPORTED`.
    pub async fn save_todos(&self, todos: &[Todo]) -> Result<(), StorageError> {
        self.save_json(TODOS_KEY, todos).await
    }

    /// Loads the todo list; a missing key yields an empty list
    ///
    /// Records whose text is empty or too long are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `UNKNOWN_ERROR` for unparseable data, or the classified read failure.
    pub fn load_todos(&self) -> Result<Vec<Todo>, StorageError> {
        let todos: Vec<Todo> = self.load_json(TODOS_KEY)?.unwrap_or_default();
        let total = todos.len();

        let todos: Vec<Todo> = todos
            .into_iter()
            .filter(|todo| validate_text(&todo.text).is_ok())
            .collect();

        if todos.len() < total {
            tracing::warn!(dropped = total - todos.len(), "Dropped invalid stored todos");
        }
        Ok(todos)
    }

    /// Saves the preferences object
    ///
    /// # Errors
    ///
    /// Same as [`TodoStorage::save_todos`].
    pub async fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError> {
        self.save_json(PREFERENCES_KEY, preferences).await
    }

    /// Loads preferences; `None` if none were saved
    ///
    /// # Errors
    ///
    /// Returns `UNKNOWN_ERROR` for unparseable data, or the classified read failure.
    pub fn load_preferences(&self) -> Result<Option<Preferences>, StorageError> {
        self.load_json(PREFERENCES_KEY)
    }

    /// Removes everything this wrapper stores
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the first removal that fails.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        let backend = self.backend()?;
        for key in [TODOS_KEY, PREFERENCES_KEY] {
            backend.remove_item(key).map_err(|error| {
                tracing::warn!(key, %error, "Failed to clear storage key");
                StorageError::from(&error)
            })?;
        }
        tracing::info!("Cleared stored todos and preferences");
        Ok(())
    }

    /// Best-effort usage report
    #[must_use]
    pub fn storage_info(&self) -> StorageInfo {
        let Some(backend) = self.backend.as_deref() else {
            return StorageInfo {
                supported: false,
                used_bytes: None,
                quota_bytes: None,
                near_capacity: false,
            };
        };

        let mut info = StorageInfo {
            supported: true,
            used_bytes: backend.used_bytes(),
            quota_bytes: backend.quota_bytes(),
            near_capacity: false,
        };
        info.near_capacity = info
            .usage_ratio()
            .is_some_and(|ratio| ratio >= self.config.near_capacity_ratio);
        info
    }

    async fn save_json<T>(&self, key: &'static str, value: &T) -> Result<(), StorageError>
    where
        T: Serialize + ?Sized,
    {
        let backend = self.backend()?;
        let json = serde_json::to_string(value).map_err(|error| {
            tracing::warn!(key, %error, "Failed to serialize value for storage");
            StorageError::new(StorageErrorKind::UnknownError)
        })?;
        self.write_with_retry(backend, key, &json).await
    }

    async fn write_with_retry(
        &self,
        backend: &dyn KeyValueStore,
        key: &'static str,
        value: &str,
    ) -> Result<(), StorageError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            metrics::counter!("storage.save.attempts").increment(1);

            match backend.set_item(key, value) {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(key, attempt, "Storage write succeeded after retry");
                    }
                    return Ok(());
                },
                Err(raw) => {
                    let error = StorageError::from(&raw);
                    let kind = error.kind();

                    if !kind.is_retryable() || attempt >= max_attempts {
                        tracing::warn!(key, attempt, %kind, error = %raw, "Storage write failed");
                        metrics::counter!("storage.save.failures", "kind" => kind.code())
                            .increment(1);
                        return Err(error);
                    }

                    let delay = self.config.retry_delay * attempt;
                    tracing::debug!(
                        key,
                        attempt,
                        %kind,
                        error = %raw,
                        delay_ms = delay.as_millis(),
                        "Storage write failed, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
            }
        }
    }

    fn load_json<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, StorageError> {
        let backend = self.backend()?;

        let raw = backend.get_item(key).map_err(|error| {
            tracing::warn!(key, %error, "Storage read failed");
            StorageError::from(&error)
        })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        serde_json::from_str(&raw).map(Some).map_err(|error| {
            tracing::warn!(key, %error, "Stored value is not valid JSON for its type");
            StorageError::new(StorageErrorKind::UnknownError)
        })
    }
}
