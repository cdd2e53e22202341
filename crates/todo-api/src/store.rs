//! SQLite-backed todo storage.
//!
//! There is no pool: every request opens its own [`StoreConnection`] through
//! [`Store::acquire`] and the connection closes when it is dropped, whichever
//! way the request ends.

use std::{path::Path, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection},
    ConnectOptions, FromRow,
};
use todo_domain::{NewTodo, Stats, Todo};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT FALSE,
        created_at INTEGER NOT NULL DEFAULT (unixepoch())
    )
";

const TODO_COLUMNS: &str = "id, title, completed, created_at";

/// Where and how to open connections. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    options: SqliteConnectOptions,
}

impl Store {
    pub fn new(path: impl AsRef<Path>, busy_timeout: Duration) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(busy_timeout);
        Self { options }
    }

    /// Opens a connection scoped to the caller.
    pub async fn acquire(&self) -> Result<StoreConnection, sqlx::Error> {
        let conn = self.options.connect().await?;
        Ok(StoreConnection { conn })
    }

    /// Creates the `todos` table if it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        let mut db = self.acquire().await?;
        sqlx::query(SCHEMA).execute(&mut db.conn).await?;
        tracing::debug!("todo schema ready");
        Ok(())
    }
}

pub struct StoreConnection {
    conn: SqliteConnection,
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    completed: bool,
    created_at: i64,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo {
            id: row.id,
            title: row.title,
            completed: row.completed,
            created_at: row.created_at,
        }
    }
}

impl StoreConnection {
    /// All todos, newest first.
    pub async fn list_todos(&mut self) -> Result<Vec<Todo>, sqlx::Error> {
        let sql = format!("SELECT {TODO_COLUMNS} FROM todos ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query_as::<_, TodoRow>(&sql)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    /// Inserts a todo and returns the stored row (id and timestamp included).
    pub async fn insert_todo(&mut self, new: &NewTodo) -> Result<Todo, sqlx::Error> {
        let sql = format!("INSERT INTO todos (title) VALUES (?) RETURNING {TODO_COLUMNS}");
        let row = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(new.title())
            .fetch_one(&mut self.conn)
            .await?;
        Ok(row.into())
    }

    /// Sets the completed flag. `None` when no todo has this id.
    pub async fn set_completed(&mut self, id: i64, completed: bool) -> Result<Option<Todo>, sqlx::Error> {
        let sql = format!("UPDATE todos SET completed = ? WHERE id = ? RETURNING {TODO_COLUMNS}");
        let row = sqlx::query_as::<_, TodoRow>(&sql)
            .bind(completed)
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(row.map(Todo::from))
    }

    /// Deletes by id. Returns whether a row was removed.
    pub async fn delete_todo(&mut self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&mut self.conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn stats(&mut self) -> Result<Stats, sqlx::Error> {
        let (total, completed): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM todos")
                .fetch_one(&mut self.conn)
                .await?;
        Ok(Stats::from_counts(total, completed))
    }
}
