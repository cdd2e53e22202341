//! Server-rendered pages and htmx fragments.

use askama::Template;
use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use todo_domain::{NewTodo, Todo};

use crate::{error::ApiError, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/todos", post(create_todo))
}

/// Row as shown in the page.
pub struct TodoView {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
}

impl From<Todo> for TodoView {
    fn from(t: Todo) -> Self {
        let created_at = chrono::DateTime::from_timestamp(t.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        Self {
            id: t.id,
            title: t.title,
            completed: t.completed,
            created_at,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    todos: Vec<TodoView>,
}

#[derive(Template)]
#[template(path = "partials/todo_list.html")]
struct TodoListTemplate {
    todos: Vec<TodoView>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoForm {
    pub title: String,
}

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let mut db = state.store.acquire().await?;
    let todos = db.list_todos().await?.into_iter().map(TodoView::from).collect();
    Ok(Html(IndexTemplate { todos }.render()?))
}

/// Form post from the page; answers with the refreshed list fragment.
pub async fn create_todo(
    State(state): State<AppState>,
    Form(form): Form<CreateTodoForm>,
) -> Result<Html<String>, ApiError> {
    let new = NewTodo::new(form.title)?;
    let mut db = state.store.acquire().await?;
    db.insert_todo(&new).await?;
    let todos = db.list_todos().await?.into_iter().map(TodoView::from).collect();
    Ok(Html(TodoListTemplate { todos }.render()?))
}
