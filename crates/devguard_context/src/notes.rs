use chrono::Utc;
use devguard_storage::types::Note;
use devguard_storage::Store;
use uuid::Uuid;

use crate::error::Result;

#[allow(clippy::too_many_arguments)]
pub async fn add_project_note(
    store: &Store,
    project_id: &str,
    session_id: Option<&str>,
    category: &str,
    title: &str,
    content: &str,
    importance: i64,
    related_code: Option<&str>,
    related_entities: Vec<String>,
    tags: Vec<String>,
) -> Result<Note> {
    let note = Note {
        note_id: Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        session_id: session_id.map(str::to_string),
        category: category.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        importance: importance.clamp(1, 5),
        related_code: related_code.map(str::to_string),
        related_entities,
        tags,
        is_resolved: false,
        resolved_at: None,
        resolved_note: None,
        created_at: Utc::now(),
    };
    store.insert_note(&note).await?;
    Ok(note)
}

pub async fn resolve_note(store: &Store, note_id: &str, resolution: Option<&str>) -> Result<Note> {
    store.resolve_note(note_id, Utc::now(), resolution).await?;
    Ok(store.require_note(note_id).await?)
}

pub async fn list_project_notes(
    store: &Store,
    project_id: &str,
    category: Option<&str>,
    unresolved_only: bool,
) -> Result<Vec<Note>> {
    Ok(store
        .list_notes(project_id, category, unresolved_only)
        .await?)
}
