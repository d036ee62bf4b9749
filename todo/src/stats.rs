//! Aggregate counts over the todo list.

use crate::types::{Priority, Todo};

/// Todo counts by priority; todos without a priority are not counted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    /// High priority todos
    pub high: usize,
    /// Medium priority todos
    pub medium: usize,
    /// Low priority todos
    pub low: usize,
}

/// Summary of a todo list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TodoStats {
    /// All todos
    pub total: usize,
    /// Completed todos
    pub completed: usize,
    /// Open todos, `total - completed`
    pub active: usize,
    /// Counts by priority
    pub by_priority: PriorityCounts,
}

impl TodoStats {
    /// Share of completed todos as a whole percentage, 0 for an empty list
    #[must_use]
    pub fn completion_percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = (self.completed * 100 + self.total / 2) / self.total;
        u8::try_from(percent).unwrap_or(100)
    }
}

/// Counts todos in one pass.
#[must_use]
pub fn stats(todos: &[Todo]) -> TodoStats {
    let mut stats = TodoStats {
        total: todos.len(),
        ..TodoStats::default()
    };

    for todo in todos {
        if todo.completed {
            stats.completed += 1;
        }
        match todo.priority {
            Some(Priority::High) => stats.by_priority.high += 1,
            Some(Priority::Medium) => stats.by_priority.medium += 1,
            Some(Priority::Low) => stats.by_priority.low += 1,
            None => {},
        }
    }

    stats.active = stats.total - stats.completed;
    stats
}
