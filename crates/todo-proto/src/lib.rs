//! Message types for package `todo`, kept in sync with `proto/todo.proto`.
//!
//! The field tags below are the wire contract; never renumber them.

use todo_domain::Stats;

#[derive(Clone, PartialEq, prost::Message)]
pub struct Todo {
    #[prost(int64, tag = "1")]
    pub id: i64,
    #[prost(string, tag = "2")]
    pub title: String,
    #[prost(bool, tag = "3")]
    pub completed: bool,
    #[prost(int64, tag = "4")]
    pub created_at: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TodoList {
    #[prost(message, repeated, tag = "1")]
    pub todos: Vec<Todo>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateTodoRequest {
    #[prost(string, tag = "1")]
    pub title: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateTodoRequest {
    #[prost(bool, tag = "1")]
    pub completed: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TodoStats {
    #[prost(int64, tag = "1")]
    pub total: i64,
    #[prost(int64, tag = "2")]
    pub completed: i64,
    #[prost(int64, tag = "3")]
    pub active: i64,
}

/// Envelope for every mutating call and for stats.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ApiResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(oneof = "api_response::Payload", tags = "3, 4")]
    pub payload: Option<api_response::Payload>,
}

pub mod api_response {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "3")]
        Todo(super::Todo),
        #[prost(message, tag = "4")]
        Stats(super::TodoStats),
    }
}

impl From<todo_domain::Todo> for Todo {
    fn from(t: todo_domain::Todo) -> Self {
        Self {
            id: t.id,
            title: t.title,
            completed: t.completed,
            created_at: t.created_at,
        }
    }
}

impl From<Stats> for TodoStats {
    fn from(s: Stats) -> Self {
        Self {
            total: s.total(),
            completed: s.completed(),
            active: s.active(),
        }
    }
}

impl FromIterator<todo_domain::Todo> for TodoList {
    fn from_iter<I: IntoIterator<Item = todo_domain::Todo>>(iter: I) -> Self {
        Self {
            todos: iter.into_iter().map(Todo::from).collect(),
        }
    }
}

impl ApiResponse {
    /// Successful call carrying no payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_todo(message: impl Into<String>, todo: impl Into<Todo>) -> Self {
        Self {
            payload: Some(api_response::Payload::Todo(todo.into())),
            ..Self::ok(message)
        }
    }

    pub fn with_stats(stats: impl Into<TodoStats>) -> Self {
        Self {
            payload: Some(api_response::Payload::Stats(stats.into())),
            ..Self::ok(String::new())
        }
    }

    pub fn todo(&self) -> Option<&Todo> {
        match &self.payload {
            Some(api_response::Payload::Todo(t)) => Some(t),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&TodoStats> {
        match &self.payload {
            Some(api_response::Payload::Stats(s)) => Some(s),
            _ => None,
        }
    }
}
