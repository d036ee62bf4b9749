//! Reducer logic for the todo list.
//!
//! The reducer is the only code that mutates [`TodoState`]. Actions naming an
//! unknown todo leave the state untouched; that is logged at debug level and
//! otherwise ignored. Invalid text is rejected into `ui.input_error` instead
//! of being stored.
//!
//! When the environment carries a [`Persistence`] handle, every change to
//! persisted data returns a save effect for the new snapshot. While a load is
//! in flight (`ui.is_loading`) nothing is saved: the snapshot in memory is not
//! yet the stored one, and writing it would overwrite what is being loaded.

use crate::persistence::Persistence;
use crate::types::{Todo, TodoAction, TodoId, TodoState};
use crate::validation::{normalize_category, validate_text};
use std::sync::Arc;
use tabtodo_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};

type Effects = SmallVec<[Effect<TodoAction>; 4]>;

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for generating timestamps
    pub clock: Arc<dyn Clock>,
    /// Where state changes are persisted; `None` keeps everything in memory
    pub persistence: Option<Persistence>,
}

impl TodoEnvironment {
    /// Creates an in-memory `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            persistence: None,
        }
    }

    /// Persist state changes through `persistence`
    #[must_use]
    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = Some(persistence);
        self
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Persistence to save through, unless a load is still in flight
    fn saver<'a>(state: &TodoState, env: &'a TodoEnvironment) -> Option<&'a Persistence> {
        let persistence = env.persistence.as_ref()?;
        if state.ui.is_loading {
            tracing::debug!(revision = state.revision, "Load in flight; save held back");
            return None;
        }
        Some(persistence)
    }

    /// Bumps the revision and saves the todo list
    fn todos_changed(state: &mut TodoState, env: &TodoEnvironment) -> Effects {
        state.revision += 1;
        match Self::saver(state, env) {
            Some(persistence) => smallvec![persistence.save_todos(state.revision, state.todos.clone())],
            None => SmallVec::new(),
        }
    }

    /// Bumps the revision and saves the preferences
    fn preferences_changed(state: &mut TodoState, env: &TodoEnvironment) -> Effects {
        state.revision += 1;
        match Self::saver(state, env) {
            Some(persistence) => {
                smallvec![persistence.save_preferences(state.revision, state.preferences())]
            },
            None => SmallVec::new(),
        }
    }

    fn position(state: &TodoState, id: &TodoId, action: &'static str) -> Option<usize> {
        let position = state.todos.iter().position(|t| &t.id == id);
        if position.is_none() {
            tracing::debug!(%id, action, "No todo with this id; ignoring");
        }
        position
    }

    fn add(
        state: &mut TodoState,
        env: &TodoEnvironment,
        text: &str,
        todo: impl FnOnce(String) -> Todo,
    ) -> Effects {
        if let Err(error) = validate_text(text) {
            tracing::debug!(reason = error.code(), "Rejected todo text");
            state.ui.input_error = Some(error);
            return SmallVec::new();
        }

        state.todos.push(todo(text.trim().to_string()));
        state.ui.show_add_form = false;
        state.ui.input_error = None;
        Self::todos_changed(state, env)
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            // ========== Todo collection ==========
            TodoAction::AddTodo {
                text,
                priority,
                category,
            } => {
                let now = env.clock.now();
                Self::add(state, env, &text, |text| {
                    Todo::new(TodoId::new(), text, now)
                        .with_priority(priority)
                        .with_category(normalize_category(category))
                })
            },

            TodoAction::UpdateTodo { id, mut changes } => {
                let Some(index) = Self::position(state, &id, "update") else {
                    return SmallVec::new();
                };

                if let Some(text) = changes.text.as_mut() {
                    if let Err(error) = validate_text(text) {
                        tracing::debug!(%id, reason = error.code(), "Rejected todo text");
                        state.ui.input_error = Some(error);
                        return SmallVec::new();
                    }
                    *text = text.trim().to_string();
                }
                if let Some(category) = changes.category.take() {
                    changes.category = Some(normalize_category(category));
                }

                state.todos[index].apply(changes, env.clock.now());
                state.ui.editing_id = None;
                state.ui.input_error = None;
                Self::todos_changed(state, env)
            },

            TodoAction::ToggleTodo { id } => {
                let Some(index) = Self::position(state, &id, "toggle") else {
                    return SmallVec::new();
                };
                state.todos[index].toggle(env.clock.now());
                Self::todos_changed(state, env)
            },

            TodoAction::MarkAllComplete => {
                let now = env.clock.now();
                let mut changed = 0;
                for todo in state.todos.iter_mut().filter(|t| !t.completed) {
                    todo.complete(now);
                    changed += 1;
                }

                if changed == 0 {
                    return SmallVec::new();
                }
                tracing::debug!(changed, "Marked todos complete");
                Self::todos_changed(state, env)
            },

            TodoAction::DeleteTodo { id } => {
                let Some(index) = Self::position(state, &id, "delete") else {
                    return SmallVec::new();
                };
                state.todos.remove(index);
                if state.ui.editing_id.as_ref() == Some(&id) {
                    state.ui.editing_id = None;
                }
                Self::todos_changed(state, env)
            },

            TodoAction::ClearAllCompleted => {
                let before = state.todos.len();
                state.todos.retain(|t| !t.completed);
                if state.todos.len() == before {
                    return SmallVec::new();
                }

                let editing_gone = state
                    .ui
                    .editing_id
                    .as_ref()
                    .is_some_and(|id| !state.todos.iter().any(|t| &t.id == id));
                if editing_gone {
                    state.ui.editing_id = None;
                }
                tracing::debug!(removed = before - state.todos.len(), "Cleared completed todos");
                Self::todos_changed(state, env)
            },

            TodoAction::LoadTodos(todos) => {
                state.todos = todos;
                state.ui.is_loading = false;
                state.ui.error = None;
                SmallVec::new()
            },

            // ========== Persisted preferences ==========
            TodoAction::SetFilter(filter) => {
                state.filter = filter;
                Self::preferences_changed(state, env)
            },

            TodoAction::SetSort(sort) => {
                state.sort = sort;
                Self::preferences_changed(state, env)
            },

            TodoAction::SetSearchText(text) => {
                state.ui.search_text = text;
                Self::preferences_changed(state, env)
            },

            TodoAction::SetTheme(theme) => {
                state.ui.theme = theme;
                Self::preferences_changed(state, env)
            },

            TodoAction::ToggleCompactView => {
                state.ui.compact_view = !state.ui.compact_view;
                Self::preferences_changed(state, env)
            },

            TodoAction::ApplyPreferences(preferences) => {
                state.filter = preferences.filter;
                state.sort = preferences.sort;
                state.ui.theme = preferences.ui.theme;
                state.ui.compact_view = preferences.ui.compact_view;
                state.ui.search_text = preferences.ui.search_text;
                SmallVec::new()
            },

            // ========== Transient UI ==========
            TodoAction::SetLoading(loading) => {
                state.ui.is_loading = loading;
                SmallVec::new()
            },

            TodoAction::SetError(error) => {
                if error.is_some() {
                    state.ui.is_loading = false;
                }
                state.ui.error = error;
                SmallVec::new()
            },

            TodoAction::ToggleEditForm => {
                state.ui.show_add_form = !state.ui.show_add_form;
                SmallVec::new()
            },

            TodoAction::SetEditingId(id) => {
                state.ui.editing_id = id;
                SmallVec::new()
            },

            TodoAction::ToggleSidebar => {
                state.ui.sidebar_open = !state.ui.sidebar_open;
                SmallVec::new()
            },

            TodoAction::Hydrate => match &env.persistence {
                Some(persistence) => {
                    state.ui.is_loading = true;
                    smallvec![persistence.hydrate()]
                },
                None => {
                    tracing::debug!("No persistence configured; nothing to load");
                    SmallVec::new()
                },
            },
        }
    }
}
