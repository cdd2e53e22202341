//! Protobuf API under `/api`.

use axum::extract::{Path, State};
use proto_router::{ProtoBody, ProtoRouter, Reply};
use todo_domain::NewTodo;
use todo_proto::{ApiResponse, CreateTodoRequest, TodoList, UpdateTodoRequest};

use crate::{error::ApiError, AppState};

pub fn routes() -> ProtoRouter<AppState> {
    ProtoRouter::new()
        .get("/api/todos", list_todos)
        .post("/api/todos", create_todo)
        .put("/api/todos/:id/toggle", toggle_todo)
        .delete("/api/todos/:id", delete_todo)
        .get("/api/stats", get_stats)
}

#[tracing::instrument(skip_all)]
pub async fn list_todos(State(state): State<AppState>) -> Result<Reply<TodoList>, ApiError> {
    let mut db = state.store.acquire().await?;
    let todos = db.list_todos().await?;
    Ok(todos.into_iter().collect::<TodoList>().into())
}

#[tracing::instrument(skip_all)]
pub async fn create_todo(
    State(state): State<AppState>,
    ProtoBody(req): ProtoBody<CreateTodoRequest>,
) -> Result<Reply<ApiResponse>, ApiError> {
    let new = NewTodo::new(req.title)?;
    let mut db = state.store.acquire().await?;
    let todo = db.insert_todo(&new).await?;
    tracing::info!(todo_id = todo.id, "todo created");
    Ok(ApiResponse::with_todo("Todo created", todo).into())
}

/// Sets `completed` to the requested value. Unknown ids get a bare 404.
#[tracing::instrument(skip_all, fields(todo_id = id))]
pub async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ProtoBody(req): ProtoBody<UpdateTodoRequest>,
) -> Result<Reply<ApiResponse>, ApiError> {
    let mut db = state.store.acquire().await?;
    let todo = db
        .set_completed(id, req.completed)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(ApiResponse::with_todo("Todo updated", todo).into())
}

/// Unknown ids get a bare 404, same as toggle.
#[tracing::instrument(skip_all, fields(todo_id = id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Reply<ApiResponse>, ApiError> {
    let mut db = state.store.acquire().await?;
    if !db.delete_todo(id).await? {
        return Err(ApiError::NotFound);
    }
    Ok(ApiResponse::ok("Todo deleted").into())
}

#[tracing::instrument(skip_all)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Reply<ApiResponse>, ApiError> {
    let mut db = state.store.acquire().await?;
    let stats = db.stats().await?;
    Ok(ApiResponse::with_stats(stats).into())
}
