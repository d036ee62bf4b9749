//! Effects that connect the reducer to [`TodoStorage`].
//!
//! Every state change that must be persisted carries the state revision it
//! produced. Saves for the same key run one at a time, and a save whose
//! revision is not newer than the last one written is skipped, so an older
//! snapshot can never overwrite a newer one.

use crate::storage::TodoStorage;
use crate::types::{Preferences, Todo, TodoAction};
use std::sync::Arc;
use tabtodo_core::effect::Effect;
use tokio::sync::Mutex;

/// Persistence handle injected into the reducer environment
#[derive(Clone, Debug)]
pub struct Persistence {
    storage: Arc<TodoStorage>,
    todos_written: Arc<Mutex<u64>>,
    preferences_written: Arc<Mutex<u64>>,
}

impl Persistence {
    /// Wraps a storage instance
    #[must_use]
    pub fn new(storage: Arc<TodoStorage>) -> Self {
        Self {
            storage,
            todos_written: Arc::new(Mutex::new(0)),
            preferences_written: Arc::new(Mutex::new(0)),
        }
    }

    /// The wrapped storage
    #[must_use]
    pub const fn storage(&self) -> &Arc<TodoStorage> {
        &self.storage
    }

    /// Effect that writes the todo snapshot taken at `revision`
    ///
    /// A failed save feeds back [`TodoAction::SetError`].
    #[must_use]
    pub fn save_todos(&self, revision: u64, todos: Vec<Todo>) -> Effect<TodoAction> {
        let storage = Arc::clone(&self.storage);
        let written = Arc::clone(&self.todos_written);

        Effect::future(async move {
            let mut written = written.lock().await;
            if revision <= *written {
                tracing::trace!(revision, "Skipping superseded todo snapshot");
                return None;
            }

            match storage.save_todos(&todos).await {
                Ok(()) => {
                    *written = revision;
                    tracing::debug!(revision, count = todos.len(), "Saved todos");
                    None
                },
                Err(error) => Some(TodoAction::SetError(Some(error.message().to_string()))),
            }
        })
    }

    /// Effect that writes the preferences taken at `revision`
    #[must_use]
    pub fn save_preferences(&self, revision: u64, preferences: Preferences) -> Effect<TodoAction> {
        let storage = Arc::clone(&self.storage);
        let written = Arc::clone(&self.preferences_written);

        Effect::future(async move {
            let mut written = written.lock().await;
            if revision <= *written {
                tracing::trace!(revision, "Skipping superseded preferences snapshot");
                return None;
            }

            match storage.save_preferences(&preferences).await {
                Ok(()) => {
                    *written = revision;
                    None
                },
                Err(error) => Some(TodoAction::SetError(Some(error.message().to_string()))),
            }
        })
    }

    /// Effect that loads preferences, then todos
    ///
    /// Feeds back [`TodoAction::ApplyPreferences`] (when any were saved) and
    /// [`TodoAction::LoadTodos`], or [`TodoAction::SetError`] on failure.
    #[must_use]
    pub fn hydrate(&self) -> Effect<TodoAction> {
        let for_preferences = Arc::clone(&self.storage);
        let for_todos = Arc::clone(&self.storage);

        Effect::chain(vec![
            Effect::future(async move {
                match for_preferences.load_preferences() {
                    Ok(Some(preferences)) => Some(TodoAction::ApplyPreferences(preferences)),
                    Ok(None) => None,
                    // Defaults are fine; the todo load reports storage trouble
                    Err(error) => {
                        tracing::debug!(kind = %error.kind(), "Preferences not loaded");
                        None
                    },
                }
            }),
            Effect::future(async move {
                match for_todos.load_todos() {
                    Ok(todos) => {
                        tracing::info!(count = todos.len(), "Loaded todos from storage");
                        Some(TodoAction::LoadTodos(todos))
                    },
                    Err(error) => Some(TodoAction::SetError(Some(error.message().to_string()))),
                }
            }),
        ])
    }
}
