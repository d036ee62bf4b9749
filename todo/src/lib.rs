//! Session-scoped todo list.
//!
//! The crate holds everything a to-do view needs apart from rendering:
//!
//! - [`types`]: todos, filters, sort keys, preferences and the [`TodoAction`] set
//! - [`reducer`]: the [`TodoReducer`], the only code that mutates [`TodoState`]
//! - [`filter`], [`stats`], [`format`]: pure derivations for display
//! - [`storage`]: persistence in a session-scoped key-value store with
//!   classified errors and bounded retries
//! - [`persistence`]: effects that save every change and hydrate on startup
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tabtodo::config::AppConfig;
//! use tabtodo::persistence::Persistence;
//! use tabtodo::storage::{SessionStorage, TodoStorage};
//! use tabtodo::{TodoAction, TodoEnvironment, TodoReducer, TodoState};
//! use tabtodo_core::environment::SystemClock;
//! use tabtodo_runtime::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let session = Arc::new(SessionStorage::new(config.session_quota_bytes));
//! let storage = Arc::new(TodoStorage::new(session, config.storage));
//!
//! let env = TodoEnvironment::new(Arc::new(SystemClock))
//!     .with_persistence(Persistence::new(storage));
//! let store = Store::new(TodoState::new(), TodoReducer::new(), env);
//!
//! store.send(TodoAction::Hydrate).await?.wait().await;
//! store.send(TodoAction::add("Buy milk")).await?.wait().await;
//!
//! let visible = store
//!     .state(|s| s.visible().into_iter().map(|t| t.text.clone()).collect::<Vec<_>>())
//!     .await;
//! println!("{visible:?}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod filter;
pub mod format;
pub mod persistence;
pub mod reducer;
pub mod stats;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use reducer::{TodoEnvironment, TodoReducer};
pub use stats::{TodoStats, stats};
pub use types::{Filter, Priority, SortKey, Theme, Todo, TodoAction, TodoChanges, TodoId, TodoState};
pub use validation::{MAX_TODO_LENGTH, ValidationError};
