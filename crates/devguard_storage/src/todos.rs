use sqlx::Row;

use crate::error::{Result, StorageError};
use crate::types::{Todo, TodoStatus};
use crate::{json_col, json_text, Store};

impl Store {
    pub async fn insert_todo(&self, t: &Todo) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO todos
                (todo_id, project_id, session_id, title, description, category, priority,
                 estimated_difficulty, estimated_hours, status, progress, depends_on,
                 completed_at, completion_note, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&t.todo_id)
        .bind(&t.project_id)
        .bind(&t.session_id)
        .bind(&t.title)
        .bind(&t.description)
        .bind(&t.category)
        .bind(t.priority)
        .bind(t.estimated_difficulty)
        .bind(t.estimated_hours)
        .bind(t.status.as_str())
        .bind(t.progress)
        .bind(json_text(&t.depends_on))
        .bind(t.completed_at)
        .bind(&t.completion_note)
        .bind(t.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_todo(&self, todo_id: &str) -> Result<Option<Todo>> {
        let row = sqlx::query(
            "SELECT todo_id, project_id, session_id, title, description, category, priority,
                    estimated_difficulty, estimated_hours, status, progress, depends_on,
                    completed_at, completion_note, created_at
             FROM todos WHERE todo_id = ?",
        )
        .bind(todo_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(todo_from_row).transpose()
    }

    pub async fn require_todo(&self, todo_id: &str) -> Result<Todo> {
        self.get_todo(todo_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("todo {todo_id}")))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update_todo_status(
        &self,
        todo_id: &str,
        status: TodoStatus,
        progress: i64,
        completed_at: Option<chrono::DateTime<chrono::Utc>>,
        completion_note: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE todos SET status = ?, progress = ?, completed_at = ?, completion_note = ?
             WHERE todo_id = ?",
        )
        .bind(status.as_str())
        .bind(progress)
        .bind(completed_at)
        .bind(completion_note)
        .bind(todo_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_todos(
        &self,
        project_id: &str,
        status: Option<TodoStatus>,
        category: Option<&str>,
    ) -> Result<Vec<Todo>> {
        let mut sql = String::from(
            "SELECT todo_id, project_id, session_id, title, description, category, priority,
                    estimated_difficulty, estimated_hours, status, progress, depends_on,
                    completed_at, completion_note, created_at
             FROM todos WHERE project_id = ?",
        );
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if category.is_some() {
            sql.push_str(" AND category = ?");
        }
        sql.push_str(" ORDER BY priority DESC, created_at");

        let mut q = sqlx::query(&sql).bind(project_id);
        if let Some(s) = status {
            q = q.bind(s.as_str());
        }
        if let Some(c) = category {
            q = q.bind(c);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(todo_from_row).collect()
    }

    /// All todos for a project, used by dependency-graph and
    /// `get_next_todo` computation (kept in `devguard_context` since it
    /// needs graph logic, not just a query).
    pub async fn all_todos(&self, project_id: &str) -> Result<Vec<Todo>> {
        self.list_todos(project_id, None, None).await
    }
}

fn todo_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Todo> {
    let status_str: String = row.get("status");
    let depends_raw: String = row.get("depends_on");
    Ok(Todo {
        todo_id: row.get("todo_id"),
        project_id: row.get("project_id"),
        session_id: row.get("session_id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        priority: row.get("priority"),
        estimated_difficulty: row.get("estimated_difficulty"),
        estimated_hours: row.get("estimated_hours"),
        status: TodoStatus::parse(&status_str).unwrap_or(TodoStatus::Pending),
        progress: row.get("progress"),
        depends_on: json_col("depends_on", &depends_raw)?,
        completed_at: row.get("completed_at"),
        completion_note: row.get("completion_note"),
        created_at: row.get("created_at"),
    })
}
