use sqlx::Row;

use crate::error::{Result, StorageError};
use crate::types::Session;
use crate::{json_col, json_text, Store};

impl Store {
    pub async fn insert_session(&self, s: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions
                (session_id, project_id, start_time, end_time, duration_minutes,
                 goals, achievements, next_steps, files_modified, issues_encountered,
                 context_summary)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&s.session_id)
        .bind(&s.project_id)
        .bind(s.start_time)
        .bind(s.end_time)
        .bind(s.duration_minutes)
        .bind(&s.goals)
        .bind(&s.achievements)
        .bind(&s.next_steps)
        .bind(json_text(&s.files_modified))
        .bind(json_text(&s.issues_encountered))
        .bind(&s.context_summary)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Closes a session: stamps `end_time`/`duration_minutes` and the
    /// summarizing fields written by `end_dev_session`.
    #[allow(clippy::too_many_arguments)]
    pub async fn end_session(
        &self,
        session_id: &str,
        end_time: chrono::DateTime<chrono::Utc>,
        duration_minutes: i64,
        achievements: Option<&str>,
        next_steps: Option<&str>,
        files_modified: &[String],
        issues_encountered: &[String],
        context_summary: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions SET
                end_time = ?, duration_minutes = ?, achievements = ?, next_steps = ?,
                files_modified = ?, issues_encountered = ?, context_summary = ?
            WHERE session_id = ?
            "#,
        )
        .bind(end_time)
        .bind(duration_minutes)
        .bind(achievements)
        .bind(next_steps)
        .bind(json_text(&files_modified.to_vec()))
        .bind(json_text(&issues_encountered.to_vec()))
        .bind(context_summary)
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT session_id, project_id, start_time, end_time, duration_minutes, goals,
                    achievements, next_steps, files_modified, issues_encountered, context_summary
             FROM sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(session_from_row).transpose()
    }

    pub async fn require_session(&self, session_id: &str) -> Result<Session> {
        self.get_session(session_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("session {session_id}")))
    }

    /// The most recently started session for a project that has no
    /// `end_time` yet, if any (at most one is expected at a time).
    pub async fn open_session(&self, project_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT session_id, project_id, start_time, end_time, duration_minutes, goals,
                    achievements, next_steps, files_modified, issues_encountered, context_summary
             FROM sessions WHERE project_id = ? AND end_time IS NULL
             ORDER BY start_time DESC LIMIT 1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(session_from_row).transpose()
    }

    pub async fn list_sessions(&self, project_id: &str, limit: i64) -> Result<Vec<Session>> {
        let rows = sqlx::query(
            "SELECT session_id, project_id, start_time, end_time, duration_minutes, goals,
                    achievements, next_steps, files_modified, issues_encountered, context_summary
             FROM sessions WHERE project_id = ? ORDER BY start_time DESC LIMIT ?",
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(session_from_row).collect()
    }
}

fn session_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Session> {
    let files_raw: String = row.get("files_modified");
    let issues_raw: String = row.get("issues_encountered");
    Ok(Session {
        session_id: row.get("session_id"),
        project_id: row.get("project_id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        duration_minutes: row.get("duration_minutes"),
        goals: row.get("goals"),
        achievements: row.get("achievements"),
        next_steps: row.get("next_steps"),
        files_modified: json_col("files_modified", &files_raw)?,
        issues_encountered: json_col("issues_encountered", &issues_raw)?,
        context_summary: row.get("context_summary"),
    })
}
