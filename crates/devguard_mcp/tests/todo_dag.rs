//! End-to-end: TODO priority ordering gated by dependency completion, plus
//! the dependency-validity checks `create_todo` runs up front.
//!
//! `depends_on` is fixed at creation time and never mutated afterward, so
//! every edge a new TODO adds points only at already-existing TODOs — the
//! dependency graph is a DAG by construction. There is no operation to
//! attach a dependency to an already-created TODO, so the cycle this
//! forecloses can't be provoked through the current tool catalog; what's
//! exercised here is the half of the scenario that is reachable: priority
//! ordering, dependency gating, and rejection of a dependency on an unknown
//! TODO id.

use devguard_context::error::ContextError;
use devguard_mcp::config::ServerConfig;
use devguard_mcp::state::AppState;
use devguard_storage::types::{Project, TodoStatus};

async fn memory_state() -> AppState {
    let config = ServerConfig {
        db_url: "sqlite::memory:".to_string(),
        audit_log_path: None,
        ..Default::default()
    };
    AppState::new(config).await.unwrap()
}

#[tokio::test]
async fn get_next_todo_respects_priority_and_dependency_gating() {
    let state = memory_state().await;
    let project_id = "proj-todos";
    state
        .store
        .upsert_project(&Project {
            project_id: project_id.to_string(),
            name: "demo".to_string(),
            path: "/tmp/unused".to_string(),
            language: None,
            created_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let t1 = devguard_context::todos::create_todo(
        &state.store, project_id, None, "first", None, "chore", 5, 3, None, vec![],
    )
    .await
    .unwrap();

    let t2 = devguard_context::todos::create_todo(
        &state.store, project_id, None, "second", None, "chore", 4, 3, None, vec![t1.todo_id.clone()],
    )
    .await
    .unwrap();

    devguard_context::todos::create_todo(
        &state.store, project_id, None, "third", None, "chore", 3, 3, None, vec![t2.todo_id.clone()],
    )
    .await
    .unwrap();

    let next = devguard_context::todos::get_next_todo(&state.store, project_id).await.unwrap().unwrap();
    assert_eq!(next.todo_id, t1.todo_id, "#1 has no unmet dependencies and the highest priority");

    devguard_context::todos::update_todo_status(&state.store, &t1.todo_id, TodoStatus::Completed, 100, None)
        .await
        .unwrap();

    let next = devguard_context::todos::get_next_todo(&state.store, project_id).await.unwrap().unwrap();
    assert_eq!(next.todo_id, t2.todo_id, "#2 unblocks once #1 completes");

    let bogus = devguard_context::todos::create_todo(
        &state.store,
        project_id,
        None,
        "depends on nothing real",
        None,
        "chore",
        3,
        3,
        None,
        vec!["does-not-exist".to_string()],
    )
    .await;
    assert!(matches!(bogus, Err(ContextError::UnknownDependency(_, _))));
}
