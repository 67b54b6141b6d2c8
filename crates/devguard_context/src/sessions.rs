use chrono::Utc;
use devguard_storage::types::Session;
use devguard_storage::Store;
use uuid::Uuid;

use crate::error::{ContextError, Result};

pub async fn start_session(store: &Store, project_id: &str, goals: &str) -> Result<Session> {
    let session = Session {
        session_id: Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        start_time: Utc::now(),
        end_time: None,
        duration_minutes: None,
        goals: goals.to_string(),
        achievements: None,
        next_steps: None,
        files_modified: Vec::new(),
        issues_encountered: Vec::new(),
        context_summary: None,
    };
    store.insert_session(&session).await?;
    Ok(session)
}

#[allow(clippy::too_many_arguments)]
pub async fn end_session(
    store: &Store,
    session_id: &str,
    achievements: Option<&str>,
    next_steps: Option<&str>,
    files_modified: &[String],
    issues_encountered: &[String],
) -> Result<Session> {
    let session = store.require_session(session_id).await?;
    if session.end_time.is_some() {
        return Err(ContextError::SessionAlreadyClosed(session_id.to_string()));
    }

    let end_time = Utc::now();
    let duration_minutes = (end_time - session.start_time).num_minutes().max(0);
    let context_summary = generate_resume_context(&session, achievements, next_steps);

    store
        .end_session(
            session_id,
            end_time,
            duration_minutes,
            achievements,
            next_steps,
            files_modified,
            issues_encountered,
            Some(&context_summary),
        )
        .await?;

    store
        .get_session(session_id)
        .await?
        .ok_or_else(|| ContextError::Storage(devguard_storage::StorageError::NotFound(
            format!("session {session_id}"),
        )))
}

/// A short human-readable paragraph a future session can pick up from,
/// combining the session's stated goals with what actually got done.
fn generate_resume_context(
    session: &Session,
    achievements: Option<&str>,
    next_steps: Option<&str>,
) -> String {
    let mut parts = vec![format!("Goals: {}", session.goals)];
    if let Some(a) = achievements {
        parts.push(format!("Achieved: {a}"));
    }
    if let Some(n) = next_steps {
        parts.push(format!("Next: {n}"));
    }
    parts.join(" | ")
}

pub async fn list_sessions(store: &Store, project_id: &str, limit: i64) -> Result<Vec<Session>> {
    Ok(store.list_sessions(project_id, limit).await?)
}
