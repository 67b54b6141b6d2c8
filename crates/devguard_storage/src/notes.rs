use sqlx::Row;

use crate::error::{Result, StorageError};
use crate::types::Note;
use crate::{json_col, json_text, Store};

impl Store {
    pub async fn insert_note(&self, n: &Note) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notes
                (note_id, project_id, session_id, category, title, content, importance,
                 related_code, related_entities, tags, is_resolved, resolved_at,
                 resolved_note, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&n.note_id)
        .bind(&n.project_id)
        .bind(&n.session_id)
        .bind(&n.category)
        .bind(&n.title)
        .bind(&n.content)
        .bind(n.importance)
        .bind(&n.related_code)
        .bind(json_text(&n.related_entities))
        .bind(json_text(&n.tags))
        .bind(n.is_resolved)
        .bind(n.resolved_at)
        .bind(&n.resolved_note)
        .bind(n.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn resolve_note(
        &self,
        note_id: &str,
        resolved_at: chrono::DateTime<chrono::Utc>,
        resolved_note: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE notes SET is_resolved = 1, resolved_at = ?, resolved_note = ? WHERE note_id = ?",
        )
        .bind(resolved_at)
        .bind(resolved_note)
        .bind(note_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_note(&self, note_id: &str) -> Result<Option<Note>> {
        let row = sqlx::query(
            "SELECT note_id, project_id, session_id, category, title, content, importance,
                    related_code, related_entities, tags, is_resolved, resolved_at,
                    resolved_note, created_at
             FROM notes WHERE note_id = ?",
        )
        .bind(note_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(note_from_row).transpose()
    }

    pub async fn require_note(&self, note_id: &str) -> Result<Note> {
        self.get_note(note_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("note {note_id}")))
    }

    pub async fn list_notes(
        &self,
        project_id: &str,
        category: Option<&str>,
        unresolved_only: bool,
    ) -> Result<Vec<Note>> {
        let mut sql = String::from(
            "SELECT note_id, project_id, session_id, category, title, content, importance,
                    related_code, related_entities, tags, is_resolved, resolved_at,
                    resolved_note, created_at
             FROM notes WHERE project_id = ?",
        );
        if category.is_some() {
            sql.push_str(" AND category = ?");
        }
        if unresolved_only {
            sql.push_str(" AND is_resolved = 0");
        }
        sql.push_str(" ORDER BY importance DESC, created_at DESC");

        let mut q = sqlx::query(&sql).bind(project_id);
        if let Some(c) = category {
            q = q.bind(c);
        }
        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(note_from_row).collect()
    }
}

fn note_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Note> {
    let related_entities_raw: String = row.get("related_entities");
    let tags_raw: String = row.get("tags");
    let is_resolved: i64 = row.get("is_resolved");
    Ok(Note {
        note_id: row.get("note_id"),
        project_id: row.get("project_id"),
        session_id: row.get("session_id"),
        category: row.get("category"),
        title: row.get("title"),
        content: row.get("content"),
        importance: row.get("importance"),
        related_code: row.get("related_code"),
        related_entities: json_col("related_entities", &related_entities_raw)?,
        tags: json_col("tags", &tags_raw)?,
        is_resolved: is_resolved != 0,
        resolved_at: row.get("resolved_at"),
        resolved_note: row.get("resolved_note"),
        created_at: row.get("created_at"),
    })
}
