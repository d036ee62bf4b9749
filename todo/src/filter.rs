//! Derived, ordered views of the todo list.
//!
//! Completed todos always sink below open ones, whatever the sort key. Within
//! each half the sort key applies; ties keep insertion order because every sort
//! here is stable.

use crate::types::{Filter, Priority, SortKey, Todo};
use std::cmp::Ordering;

/// Returns the todos to display, in display order.
///
/// `search_text` is trimmed and matched case-insensitively against the text
/// and the category. The input slice is only borrowed.
#[must_use]
pub fn process<'a>(
    todos: &'a [Todo],
    filter: Filter,
    sort: SortKey,
    search_text: &str,
) -> Vec<&'a Todo> {
    let needle = search_text.trim().to_lowercase();

    let (mut open, mut done): (Vec<&Todo>, Vec<&Todo>) = todos
        .iter()
        .filter(|todo| filter.matches(todo))
        .filter(|todo| needle.is_empty() || matches_search(todo, &needle))
        .partition(|todo| !todo.completed);

    sort_partition(&mut open, sort);
    sort_partition(&mut done, sort);

    open.append(&mut done);
    open
}

/// Case-insensitive substring match on text or category.
///
/// `needle` must already be lowercase.
fn matches_search(todo: &Todo, needle: &str) -> bool {
    todo.text.to_lowercase().contains(needle)
        || todo
            .category
            .as_ref()
            .is_some_and(|category| category.to_lowercase().contains(needle))
}

fn sort_partition(todos: &mut [&Todo], sort: SortKey) {
    match sort {
        SortKey::Alphabetical => todos.sort_by_cached_key(|todo| todo.text.to_lowercase()),
        SortKey::Created | SortKey::Updated | SortKey::Priority => {
            todos.sort_by(|a, b| compare(sort, a, b));
        },
    }
}

/// Ordering of two todos of the same completion state under `sort`.
#[must_use]
pub fn compare(sort: SortKey, a: &Todo, b: &Todo) -> Ordering {
    match sort {
        SortKey::Created => b.created_at.cmp(&a.created_at),
        SortKey::Updated => b.updated_at.cmp(&a.updated_at),
        SortKey::Priority => Priority::rank_of(b.priority)
            .cmp(&Priority::rank_of(a.priority))
            .then_with(|| b.created_at.cmp(&a.created_at)),
        SortKey::Alphabetical => a.text.to_lowercase().cmp(&b.text.to_lowercase()),
    }
}
