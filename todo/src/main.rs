//! Command-line walkthrough of the todo list.
//!
//! Runs a short session against an in-memory session store: hydrates, adds a
//! few todos, completes one and prints the list the way a view would render it.
//! Set `RUST_LOG=tabtodo=debug` to watch saves go through.

use anyhow::Context;
use std::sync::Arc;
use tabtodo::config::AppConfig;
use tabtodo::format::relative_time;
use tabtodo::persistence::Persistence;
use tabtodo::storage::{SessionStorage, TodoStorage};
use tabtodo::{Filter, Priority, TodoAction, TodoEnvironment, TodoReducer, TodoState, stats};
use tabtodo_core::environment::{Clock, SystemClock};
use tabtodo_runtime::Store;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("invalid TABTODO_* configuration")?;
    let session = Arc::new(SessionStorage::new(config.session_quota_bytes));
    let storage = Arc::new(TodoStorage::new(session, config.storage));

    let env = TodoEnvironment::new(Arc::new(SystemClock))
        .with_persistence(Persistence::new(Arc::clone(&storage)));
    let store = Store::new(TodoState::new(), TodoReducer::new(), env);

    dispatch(&store, TodoAction::Hydrate).await?;

    println!("=== tabtodo ===\n");
    dispatch(&store, TodoAction::add("Buy milk")).await?;
    dispatch(
        &store,
        TodoAction::AddTodo {
            text: "Write report".to_string(),
            priority: Some(Priority::High),
            category: Some("work".to_string()),
        },
    )
    .await?;
    dispatch(&store, TodoAction::add("Walk dog")).await?;

    let milk = store
        .state(|s| s.todos.iter().find(|t| t.text == "Buy milk").map(|t| t.id.clone()))
        .await
        .context("todo just added is missing")?;
    dispatch(&store, TodoAction::ToggleTodo { id: milk }).await?;
    print_list(&store, "All").await;

    dispatch(&store, TodoAction::SetFilter(Filter::Active)).await?;
    print_list(&store, "Active").await;

    let info = storage.storage_info();
    println!(
        "\nStorage: {} of {} bytes used{}",
        info.used_bytes.unwrap_or(0),
        info.quota_bytes.unwrap_or(0),
        if info.near_capacity { " (nearly full)" } else { "" }
    );

    store.shutdown_default().await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabtodo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Sends `action` and waits for its saves to finish
async fn dispatch(store: &TodoStore, action: TodoAction) -> anyhow::Result<()> {
    store.send(action).await?.wait().await;

    if let Some(error) = store.state(|s| s.ui.error.clone()).await {
        tracing::warn!(%error, "Storage problem reported");
    }
    Ok(())
}

async fn print_list(store: &TodoStore, title: &str) {
    let now = SystemClock.now();
    let (lines, summary) = store
        .state(|s| {
            let lines: Vec<String> = s
                .visible()
                .into_iter()
                .map(|todo| {
                    let mark = if todo.completed { "x" } else { " " };
                    let category = todo
                        .category
                        .as_deref()
                        .map(|c| format!(" #{c}"))
                        .unwrap_or_default();
                    format!(
                        "  [{mark}] {}{category} ({})",
                        todo.text,
                        relative_time(todo.created_at, now)
                    )
                })
                .collect();
            (lines, stats(&s.todos))
        })
        .await;

    println!("{title}:");
    for line in lines {
        println!("{line}");
    }
    println!(
        "  {} open, {} done ({}% complete)\n",
        summary.active,
        summary.completed,
        summary.completion_percentage()
    );
}
