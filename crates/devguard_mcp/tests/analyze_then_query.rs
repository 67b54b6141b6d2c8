//! End-to-end: analyze a small Python tree, then query it back out through
//! the same operations a client would call.

use std::fs;

use devguard_mcp::config::ServerConfig;
use devguard_mcp::state::AppState;
use devguard_storage::types::{EntityKind, Project, RelationKind};

async fn memory_state() -> AppState {
    let config = ServerConfig {
        db_url: "sqlite::memory:".to_string(),
        audit_log_path: None,
        ..Default::default()
    };
    AppState::new(config).await.unwrap()
}

#[tokio::test]
async fn analyze_then_find_entity_and_dependencies() {
    let state = memory_state().await;
    let project_id = "proj-analyze";
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

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.py"), "class A(B):\n    pass\n").unwrap();
    fs::write(dir.path().join("b.py"), "class B:\n    def foo(self):\n        pass\n").unwrap();
    fs::write(dir.path().join("c.py"), "import a\n").unwrap();

    let summary = devguard_analyzer::analyze_codebase(&state.store, project_id, dir.path())
        .await
        .unwrap();
    assert_eq!(summary.files_analyzed, 3);

    let found = state.store.find_entities_by_name(project_id, "A").await.unwrap();
    let a = found
        .iter()
        .find(|e| e.kind == EntityKind::Class && e.qualified_name.ends_with('A'))
        .expect("class A found exactly once");
    assert_eq!(
        found.iter().filter(|e| e.kind == EntityKind::Class && e.name == "A").count(),
        1
    );

    let deps = state.store.relations_from(project_id, &a.entity_id).await.unwrap();
    let inherits: Vec<_> = deps.iter().filter(|r| r.kind == RelationKind::Inherits).collect();
    assert_eq!(inherits.len(), 1);
    let target = state.store.get_entity(inherits[0].target_id.as_ref().unwrap()).await.unwrap().unwrap();
    assert_eq!(target.name, "B");
}
