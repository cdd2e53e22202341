//! Domain model for the todo service.
//!
//! Items are owned by the store; this crate only describes the values that
//! travel through a single request and the rules they obey.

/// Domain errors (invariant violations on input).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("title must not be empty")]
    EmptyTitle,
}

/// A todo item as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Store-assigned identity, increasing with every insert.
    pub id: i64,
    pub title: String,
    pub completed: bool,
    /// Unix seconds, assigned by the store at insert time.
    pub created_at: i64,
}

/// A validated title for a todo that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    title: String,
}

impl NewTodo {
    /// Validates the title. Whitespace-only titles are rejected; the title is
    /// otherwise stored as given.
    pub fn new(title: impl Into<String>) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::EmptyTitle);
        }
        Ok(Self { title })
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Aggregate counts over all items.
///
/// Only constructible through [`Stats::from_counts`] and [`Stats::tally`], so
/// `active == total - completed` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    total: i64,
    completed: i64,
    active: i64,
}

impl Stats {
    /// Builds stats from raw counts. `completed` is clamped to `total`.
    pub fn from_counts(total: i64, completed: i64) -> Self {
        let total = total.max(0);
        let completed = completed.clamp(0, total);
        Self {
            total,
            completed,
            active: total - completed,
        }
    }

    /// Counts a set of items in memory. This is the reference projection that
    /// aggregate queries (`COUNT`/`SUM` in the store) must agree with.
    pub fn tally<'a, I>(todos: I) -> Self
    where
        I: IntoIterator<Item = &'a Todo>,
    {
        let (total, completed) = todos.into_iter().fold((0, 0), |(t, c), todo| {
            (t + 1, c + i64::from(todo.completed))
        });
        Self::from_counts(total, completed)
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn completed(&self) -> i64 {
        self.completed
    }

    pub fn active(&self) -> i64 {
        self.active
    }
}
