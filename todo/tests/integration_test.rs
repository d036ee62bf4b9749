//! End-to-end tests: store, reducer, persistence and session storage together.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use chrono::Duration;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tabtodo::config::StorageConfig;
use tabtodo::persistence::Persistence;
use tabtodo::storage::{KeyValueStore, SessionStorage, StorageErrorKind, TodoStorage};
use tabtodo::{Filter, SortKey, Theme, TodoAction, TodoEnvironment, TodoReducer, TodoState};
use tabtodo_runtime::Store;
use tabtodo_testing::ManualClock;
use tabtodo_testing::mocks::epoch;

type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

fn config() -> StorageConfig {
    StorageConfig::default().with_retry_delay(StdDuration::ZERO)
}

fn store_over(session: &Arc<SessionStorage>, clock: &ManualClock) -> (TodoStore, Arc<TodoStorage>) {
    let storage = Arc::new(TodoStorage::new(
        Arc::clone(session) as Arc<dyn KeyValueStore>,
        config(),
    ));
    let env = TodoEnvironment::new(Arc::new(clock.clone()))
        .with_persistence(Persistence::new(Arc::clone(&storage)));
    (Store::new(TodoState::new(), TodoReducer::new(), env), storage)
}

async fn dispatch(store: &TodoStore, action: TodoAction) {
    store.send(action).await.unwrap().wait().await;
}

async fn visible_texts(store: &TodoStore) -> Vec<String> {
    store
        .state(|s| s.visible().into_iter().map(|t| t.text.clone()).collect())
        .await
}

async fn id_of(store: &TodoStore, text: &str) -> tabtodo::TodoId {
    store
        .state(|s| s.todos.iter().find(|t| t.text == text).map(|t| t.id.clone()))
        .await
        .expect("todo exists")
}

#[tokio::test]
async fn add_toggle_and_filter() {
    let clock = ManualClock::new(epoch());
    let (store, _) = store_over(&Arc::new(SessionStorage::default()), &clock);

    dispatch(&store, TodoAction::add("Buy milk")).await;
    clock.advance(Duration::seconds(1));
    dispatch(&store, TodoAction::add("Walk dog")).await;

    // Newest first by default
    assert_eq!(visible_texts(&store).await, ["Walk dog", "Buy milk"]);

    let milk = id_of(&store, "Buy milk").await;
    dispatch(&store, TodoAction::ToggleTodo { id: milk }).await;
    assert_eq!(visible_texts(&store).await, ["Walk dog", "Buy milk"]);

    dispatch(&store, TodoAction::SetFilter(Filter::Active)).await;
    assert_eq!(visible_texts(&store).await, ["Walk dog"]);

    dispatch(&store, TodoAction::SetFilter(Filter::Completed)).await;
    assert_eq!(visible_texts(&store).await, ["Buy milk"]);
}

#[tokio::test]
async fn completed_todos_sink_below_open_ones() {
    let clock = ManualClock::new(epoch());
    let (store, _) = store_over(&Arc::new(SessionStorage::default()), &clock);

    for text in ["apple", "Banana", "cherry"] {
        dispatch(&store, TodoAction::add(text)).await;
        clock.advance(Duration::seconds(1));
    }
    let apple = id_of(&store, "apple").await;
    dispatch(&store, TodoAction::ToggleTodo { id: apple }).await;
    dispatch(&store, TodoAction::SetSort(SortKey::Alphabetical)).await;

    assert_eq!(visible_texts(&store).await, ["Banana", "cherry", "apple"]);
}

#[tokio::test]
async fn changes_survive_a_reload() {
    let session = Arc::new(SessionStorage::default());
    let clock = ManualClock::new(epoch());

    {
        let (store, _) = store_over(&session, &clock);
        dispatch(&store, TodoAction::add("Buy milk")).await;
        clock.advance(Duration::minutes(1));
        dispatch(&store, TodoAction::add("Walk dog")).await;
        let dog = id_of(&store, "Walk dog").await;
        dispatch(&store, TodoAction::ToggleTodo { id: dog }).await;
        dispatch(&store, TodoAction::SetTheme(Theme::Dark)).await;
        dispatch(&store, TodoAction::SetSort(SortKey::Updated)).await;
        dispatch(&store, TodoAction::ToggleSidebar).await;
        store.shutdown_default().await.unwrap();
    }

    let (reloaded, _) = store_over(&session, &clock);
    dispatch(&reloaded, TodoAction::Hydrate).await;

    let state = reloaded.state(Clone::clone).await;
    assert_eq!(state.count(), 2);
    assert_eq!(state.completed_count(), 1);
    assert_eq!(state.todos[0].text, "Buy milk");
    assert_eq!(state.todos[0].created_at, epoch());
    assert_eq!(state.todos[1].updated_at, epoch() + Duration::minutes(1));
    assert_eq!(state.ui.theme, Theme::Dark);
    assert_eq!(state.sort, SortKey::Updated);
    // Transient flags are not persisted
    assert!(!state.ui.sidebar_open);
    assert!(!state.ui.is_loading);
    assert_eq!(state.ui.error, None);
}

#[tokio::test]
async fn hydrate_with_empty_storage() {
    let clock = ManualClock::new(epoch());
    let (store, _) = store_over(&Arc::new(SessionStorage::default()), &clock);

    dispatch(&store, TodoAction::Hydrate).await;

    let state = store.state(Clone::clone).await;
    assert!(state.todos.is_empty());
    assert!(!state.ui.is_loading);
    assert_eq!(state.ui.error, None);
    assert_eq!(state.filter, Filter::All);
}

#[tokio::test]
async fn full_storage_is_reported_and_memory_keeps_working() {
    // Room for the probe but not for a saved todo
    let session = Arc::new(SessionStorage::new(48));
    let clock = ManualClock::new(epoch());
    let (store, storage) = store_over(&session, &clock);
    assert!(storage.is_supported());

    dispatch(&store, TodoAction::add("Buy milk")).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.count(), 1);
    assert_eq!(
        state.ui.error.as_deref(),
        Some(StorageErrorKind::QuotaExceeded.user_message())
    );

    dispatch(&store, TodoAction::SetError(None)).await;
    assert_eq!(store.state(|s| s.ui.error.clone()).await, None);
}

#[tokio::test]
async fn unsupported_storage_keeps_the_app_in_memory() {
    let clock = ManualClock::new(epoch());
    let storage = Arc::new(TodoStorage::unavailable(config()));
    let env = TodoEnvironment::new(Arc::new(clock.clone()))
        .with_persistence(Persistence::new(storage));
    let store = Store::new(TodoState::new(), TodoReducer::new(), env);

    dispatch(&store, TodoAction::Hydrate).await;
    assert_eq!(
        store.state(|s| s.ui.error.clone()).await.as_deref(),
        Some(StorageErrorKind::NotSupported.user_message())
    );

    dispatch(&store, TodoAction::SetError(None)).await;
    dispatch(&store, TodoAction::add("Still works")).await;
    assert_eq!(visible_texts(&store).await, ["Still works"]);
}

#[tokio::test]
async fn latest_snapshot_wins() {
    let session = Arc::new(SessionStorage::default());
    let clock = ManualClock::new(epoch());
    let (store, storage) = store_over(&session, &clock);

    // Fire without waiting so saves overlap
    let mut handles = Vec::new();
    for i in 0..20 {
        handles.push(store.send(TodoAction::add(format!("todo {i}"))).await.unwrap());
    }
    for mut handle in handles {
        handle.wait().await;
    }

    let saved = storage.load_todos().unwrap();
    assert_eq!(saved.len(), 20);
    assert_eq!(saved, store.state(|s| s.todos.clone()).await);
}

#[tokio::test]
async fn edits_during_startup_load_do_not_erase_stored_todos() {
    let session = Arc::new(SessionStorage::default());
    let clock = ManualClock::new(epoch());

    {
        let (store, _) = store_over(&session, &clock);
        for text in ["a", "b", "c"] {
            dispatch(&store, TodoAction::add(text)).await;
        }
        store.shutdown_default().await.unwrap();
    }

    let (reloaded, storage) = store_over(&session, &clock);
    // Do not wait for the load before editing
    let mut hydrate = reloaded.send(TodoAction::Hydrate).await.unwrap();
    let mut add = reloaded.send(TodoAction::add("new")).await.unwrap();
    hydrate.wait().await;
    add.wait().await;

    let saved: Vec<String> = storage
        .load_todos()
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect();
    for text in ["a", "b", "c"] {
        assert!(saved.iter().any(|s| s == text), "{text} missing from {saved:?}");
    }

    let in_memory: Vec<String> = reloaded
        .state(|s| s.todos.iter().map(|t| t.text.clone()).collect())
        .await;
    for text in ["a", "b", "c"] {
        assert!(in_memory.iter().any(|s| s == text), "{text} missing from {in_memory:?}");
    }
    assert!(!reloaded.state(|s| s.ui.is_loading).await);
}
