//! Domain types for the todo list.
//!
//! A todo list is an insertion-ordered collection of [`Todo`] records plus the
//! view preferences (filter, sort, theme) and transient UI flags that the view
//! layer renders from. Display order is never stored; it is recomputed by
//! [`crate::filter::process`].

use crate::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a todo item
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a new random `TodoId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Priority of a todo
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority
    Low,
    /// Medium priority
    Medium,
    /// High priority
    High,
}

impl Priority {
    /// Sort rank: high 3, medium 2, low 1
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Sort rank of an optional priority; todos without one rank 0
    #[must_use]
    pub const fn rank_of(priority: Option<Self>) -> u8 {
        match priority {
            Some(priority) => priority.rank(),
            None => 0,
        }
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier, immutable
    pub id: TodoId,
    /// Task text, trimmed, 1 to 500 characters
    pub text: String,
    /// Whether the todo is completed
    pub completed: bool,
    /// When the todo was created, immutable
    pub created_at: DateTime<Utc>,
    /// When the todo was last changed
    pub updated_at: DateTime<Utc>,
    /// Optional priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Optional free-text label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Todo {
    /// Creates a new open todo with both timestamps set to `now`
    #[must_use]
    pub const fn new(id: TodoId, text: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            text,
            completed: false,
            created_at: now,
            updated_at: now,
            priority: None,
            category: None,
        }
    }

    /// Sets the priority
    #[must_use]
    pub const fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the category
    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Flips the completion flag
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.completed = !self.completed;
        self.touch(now);
    }

    /// Marks the todo as completed
    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.touch(now);
    }

    /// Merges `changes` into this todo and refreshes `updated_at`
    ///
    /// Text is stored as given; callers trim and validate it first.
    pub fn apply(&mut self, changes: TodoChanges, now: DateTime<Utc>) {
        if let Some(text) = changes.text {
            self.text = text;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        self.touch(now);
    }

    // updated_at never moves behind created_at, even if the clock goes backwards.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }
}

/// Field changes carried by an update
///
/// `None` leaves a field untouched. For the optional fields the inner option
/// distinguishes "clear" (`Some(None)`) from "leave alone" (`None`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoChanges {
    /// New text
    pub text: Option<String>,
    /// New completion flag
    pub completed: Option<bool>,
    /// New priority
    pub priority: Option<Option<Priority>>,
    /// New category
    pub category: Option<Option<String>>,
}

impl TodoChanges {
    /// Changes only the text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Also change the completion flag
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Also change the priority
    #[must_use]
    pub const fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Also change the category
    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = Some(category);
        self
    }
}

/// Which todos the list shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every todo
    #[default]
    All,
    /// Only open todos
    #[serde(alias = "open")]
    Active,
    /// Only completed todos
    Completed,
}

impl Filter {
    /// Returns true if `todo` passes this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

/// Ordering applied inside each completion partition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Newest first
    #[default]
    Created,
    /// Most recently changed first
    Updated,
    /// Highest priority first, then newest
    Priority,
    /// Case-insensitive A to Z
    Alphabetical,
}

/// Color theme
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    #[default]
    Light,
    /// Dark theme
    Dark,
}

/// Persisted UI preferences
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiPreferences {
    /// Color theme
    pub theme: Theme,
    /// Denser list layout
    pub compact_view: bool,
    /// Current search text
    pub search_text: String,
}

/// Preferences persisted alongside the todo list
///
/// Transient flags (editing id, sidebar, add form) are deliberately absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Active filter
    pub filter: Filter,
    /// Active sort key
    pub sort: SortKey,
    /// UI preferences
    pub ui: UiPreferences,
}

/// UI state, persisted and transient
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UiState {
    /// Search text applied on top of the filter
    pub search_text: String,
    /// Todo currently being edited
    pub editing_id: Option<TodoId>,
    /// Whether the add form is open
    pub show_add_form: bool,
    /// Whether the sidebar is open
    pub sidebar_open: bool,
    /// Color theme
    pub theme: Theme,
    /// Denser list layout
    pub compact_view: bool,
    /// Todos are being loaded from storage
    pub is_loading: bool,
    /// Storage error to show as a dismissible banner
    pub error: Option<String>,
    /// Last rejected input, shown next to the form
    pub input_error: Option<ValidationError>,
}

/// State of the todo list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoState {
    /// All todos in insertion order
    pub todos: Vec<Todo>,
    /// Active filter
    pub filter: Filter,
    /// Active sort key
    pub sort: SortKey,
    /// UI state
    pub ui: UiState,
    /// Bumped on every change that must be persisted
    pub revision: u64,
}

impl TodoState {
    /// Creates a new empty todo state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns the number of completed todos
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|t| t.completed).count()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    /// Returns the persisted subset of the UI state
    #[must_use]
    pub fn preferences(&self) -> Preferences {
        Preferences {
            filter: self.filter,
            sort: self.sort,
            ui: UiPreferences {
                theme: self.ui.theme,
                compact_view: self.ui.compact_view,
                search_text: self.ui.search_text.clone(),
            },
        }
    }

    /// Todos in display order for the current filter, sort and search text
    #[must_use]
    pub fn visible(&self) -> Vec<&Todo> {
        crate::filter::process(&self.todos, self.filter, self.sort, &self.ui.search_text)
    }
}

/// Actions dispatched to the todo reducer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    /// Add a new todo
    AddTodo {
        /// Text of the todo, trimmed before storage
        text: String,
        /// Optional priority
        priority: Option<Priority>,
        /// Optional category
        category: Option<String>,
    },

    /// Merge changes into an existing todo
    UpdateTodo {
        /// Todo to update
        id: TodoId,
        /// Fields to change
        changes: TodoChanges,
    },

    /// Remove a todo
    DeleteTodo {
        /// Todo to delete
        id: TodoId,
    },

    /// Flip a todo's completion flag
    ToggleTodo {
        /// Todo to toggle
        id: TodoId,
    },

    /// Complete every open todo
    MarkAllComplete,

    /// Change the filter
    SetFilter(Filter),

    /// Change the sort key
    SetSort(SortKey),

    /// Change the search text
    SetSearchText(String),

    /// Set the loading flag
    SetLoading(bool),

    /// Set or dismiss the error banner
    SetError(Option<String>),

    /// Open or close the add form
    ToggleEditForm,

    /// Mark which todo is being edited
    SetEditingId(Option<TodoId>),

    /// Open or close the sidebar
    ToggleSidebar,

    /// Change the theme
    SetTheme(Theme),

    /// Switch compact view on or off
    ToggleCompactView,

    /// Remove every completed todo
    ClearAllCompleted,

    /// Replace the todo list wholesale
    LoadTodos(Vec<Todo>),

    /// Start loading todos and preferences from storage
    Hydrate,

    /// Apply preferences read from storage
    ApplyPreferences(Preferences),
}

impl TodoAction {
    /// Convenience constructor for a plain add
    #[must_use]
    pub fn add(text: impl Into<String>) -> Self {
        Self::AddTodo {
            text: text.into(),
            priority: None,
            category: None,
        }
    }
}
