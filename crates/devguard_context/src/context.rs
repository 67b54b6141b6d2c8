use devguard_storage::types::{DecisionStatus, Project, Session, TodoStatus};
use devguard_storage::Store;
use serde::Serialize;

use crate::error::Result;

/// Everything a fresh session needs to pick up a project: its most recent
/// session, open decisions, unresolved notes and the next actionable todo.
#[derive(Debug, Serialize)]
pub struct ProjectContext {
    pub project: Project,
    pub last_session: Option<Session>,
    pub active_decision_count: usize,
    pub unresolved_note_count: usize,
    pub pending_todo_count: usize,
    pub next_todo_title: Option<String>,
}

pub async fn get_project_context(store: &Store, project_id: &str) -> Result<ProjectContext> {
    let project = store.require_project(project_id).await?;
    let last_session = store.list_sessions(project_id, 1).await?.into_iter().next();
    let active_decisions = store
        .list_decisions(project_id, None, Some(DecisionStatus::Active))
        .await?;
    let unresolved_notes = store.list_notes(project_id, None, true).await?;
    let pending_todos = store
        .list_todos(project_id, Some(TodoStatus::Pending), None)
        .await?;
    let next_todo = crate::todos::get_next_todo(store, project_id).await?;

    Ok(ProjectContext {
        project,
        last_session,
        active_decision_count: active_decisions.len(),
        unresolved_note_count: unresolved_notes.len(),
        pending_todo_count: pending_todos.len(),
        next_todo_title: next_todo.map(|t| t.title),
    })
}

#[derive(Debug, Serialize)]
pub struct ProjectStatistics {
    pub session_count: usize,
    pub decision_count: usize,
    pub note_count: usize,
    pub todo_count: usize,
    pub completed_todo_count: usize,
    pub entity_count: i64,
}

pub async fn get_project_statistics(store: &Store, project_id: &str) -> Result<ProjectStatistics> {
    let sessions = store.list_sessions(project_id, i64::MAX).await?;
    let decisions = store.list_decisions(project_id, None, None).await?;
    let notes = store.list_notes(project_id, None, false).await?;
    let todos = store.all_todos(project_id).await?;
    let entity_count = store.count_entities(project_id).await?;

    Ok(ProjectStatistics {
        session_count: sessions.len(),
        decision_count: decisions.len(),
        note_count: notes.len(),
        completed_todo_count: todos
            .iter()
            .filter(|t| t.status == TodoStatus::Completed)
            .count(),
        todo_count: todos.len(),
        entity_count,
    })
}
