//! Project-context subsystem: sessions, design decisions, notes and todos.
//!
//! Thin business-logic layer over `devguard_storage`: validates invariants
//! (dependency DAGs, supersession chains) that the store itself does not
//! enforce, then delegates to it.

pub mod context;
pub mod decisions;
pub mod error;
pub mod notes;
pub mod sessions;
pub mod todos;

pub use error::{ContextError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use devguard_storage::types::{DecisionStatus, Project};
    use devguard_storage::Store;

    async fn store_with_project() -> Store {
        let store = Store::open("sqlite::memory:").await.unwrap();
        store
            .upsert_project(&Project {
                project_id: "p1".into(),
                name: "demo".into(),
                path: "/src".into(),
                language: None,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn get_next_todo_respects_dependencies() {
        let store = store_with_project().await;
        let first = todos::create_todo(
            &store, "p1", None, "write migration", None, "chore", 3, 2, None, vec![],
        )
        .await
        .unwrap();
        let second = todos::create_todo(
            &store,
            "p1",
            None,
            "wire up endpoint",
            None,
            "feature",
            5,
            3,
            None,
            vec![first.todo_id.clone()],
        )
        .await
        .unwrap();

        let next = todos::get_next_todo(&store, "p1").await.unwrap().unwrap();
        assert_eq!(next.todo_id, first.todo_id);

        todos::update_todo_status(
            &store,
            &first.todo_id,
            devguard_storage::types::TodoStatus::Completed,
            100,
            None,
        )
        .await
        .unwrap();

        let next = todos::get_next_todo(&store, "p1").await.unwrap().unwrap();
        assert_eq!(next.todo_id, second.todo_id);
    }

    #[tokio::test]
    async fn create_todo_rejects_unknown_dependency() {
        let store = store_with_project().await;
        let err = todos::create_todo(
            &store,
            "p1",
            None,
            "depends on ghost",
            None,
            "chore",
            1,
            1,
            None,
            vec!["does-not-exist".to_string()],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ContextError::UnknownDependency(_, _)));
    }

    #[tokio::test]
    async fn record_design_decision_supersedes_previous() {
        let store = store_with_project().await;
        let old = decisions::record_design_decision(
            &store,
            "p1",
            None,
            "architecture",
            "use sqlite",
            None,
            "simplicity",
            vec![],
            serde_json::json!({}),
            None,
            None,
        )
        .await
        .unwrap();

        decisions::record_design_decision(
            &store,
            "p1",
            None,
            "architecture",
            "use postgres",
            None,
            "scale",
            vec![],
            serde_json::json!({}),
            None,
            Some(&old.decision_id),
        )
        .await
        .unwrap();

        let reloaded = store.require_decision(&old.decision_id).await.unwrap();
        assert_eq!(reloaded.status, DecisionStatus::Superseded);
    }
}
