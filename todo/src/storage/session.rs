//! In-memory, session-scoped [`KeyValueStore`].

use super::backend::{BackendError, KeyValueStore};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Session storage held in process memory
///
/// Contents live exactly as long as the value, like a browser tab's session
/// storage. Usage is counted as key plus value bytes and capped by a quota.
#[derive(Debug)]
pub struct SessionStorage {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: usize,
}

impl SessionStorage {
    /// Creates an empty store with the given byte quota
    #[must_use]
    pub fn new(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, BackendError> {
        self.entries
            .lock()
            .map_err(|_| BackendError::Other("session storage lock poisoned".to_string()))
    }

    fn usage(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl Default for SessionStorage {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SESSION_QUOTA_BYTES)
    }
}

impl KeyValueStore for SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut entries = self.entries()?;

        let replaced = entries.get(key).map_or(0, |old| key.len() + old.len());
        let projected = Self::usage(&entries) - replaced + key.len() + value.len();
        if projected > self.quota_bytes {
            return Err(BackendError::QuotaExceeded(format!(
                "writing {key} needs {projected} bytes, quota is {}",
                self.quota_bytes
            )));
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), BackendError> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn used_bytes(&self) -> Option<usize> {
        self.entries().ok().map(|entries| Self::usage(&entries))
    }

    fn quota_bytes(&self) -> Option<usize> {
        Some(self.quota_bytes)
    }
}
