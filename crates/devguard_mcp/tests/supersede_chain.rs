//! End-to-end: chained decision supersession and cycle rejection.

use devguard_mcp::config::ServerConfig;
use devguard_mcp::state::AppState;
use devguard_storage::types::{DecisionStatus, Project};
use serde_json::json;

async fn memory_state() -> AppState {
    let config = ServerConfig {
        db_url: "sqlite::memory:".to_string(),
        audit_log_path: None,
        ..Default::default()
    };
    AppState::new(config).await.unwrap()
}

#[tokio::test]
async fn superseding_a_decision_twice_leaves_only_the_latest_active() {
    let state = memory_state().await;
    let project_id = "proj-decisions";
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

    let d1 = devguard_context::decisions::record_design_decision(
        &state.store,
        project_id,
        None,
        "architecture",
        "use postgres",
        None,
        "simplest option available",
        vec![],
        json!({}),
        None,
        None,
    )
    .await
    .unwrap();

    let d2 = devguard_context::decisions::record_design_decision(
        &state.store,
        project_id,
        None,
        "architecture",
        "use sqlite",
        None,
        "single-binary deploys matter more than postgres features",
        vec![],
        json!({}),
        None,
        None,
    )
    .await
    .unwrap();

    let d3 = devguard_context::decisions::record_design_decision(
        &state.store,
        project_id,
        None,
        "architecture",
        "use sqlite with litestream",
        None,
        "need durable backups without giving up single-binary deploys",
        vec![],
        json!({}),
        None,
        None,
    )
    .await
    .unwrap();

    devguard_context::decisions::supersede(&state.store, &d1.decision_id, &d2.decision_id)
        .await
        .unwrap();
    devguard_context::decisions::supersede(&state.store, &d2.decision_id, &d3.decision_id)
        .await
        .unwrap();

    let active = devguard_context::decisions::list_decisions(
        &state.store,
        project_id,
        None,
        Some(DecisionStatus::Active),
    )
    .await
    .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].decision_id, d3.decision_id);

    let d1_reloaded = state.store.require_decision(&d1.decision_id).await.unwrap();
    assert_eq!(d1_reloaded.status, DecisionStatus::Superseded);
    assert_eq!(d1_reloaded.superseded_by.as_deref(), Some(d2.decision_id.as_str()));

    // Closing the loop (d3 superseded by d1, which is already upstream of
    // d3 through d2) is rejected rather than silently corrupting the chain.
    let cycle = devguard_context::decisions::supersede(&state.store, &d3.decision_id, &d1.decision_id).await;
    assert!(cycle.is_err());

    // Rejecting the cycle must not have mutated anything.
    let d3_reloaded = state.store.require_decision(&d3.decision_id).await.unwrap();
    assert_eq!(d3_reloaded.status, DecisionStatus::Active);
    assert!(d3_reloaded.superseded_by.is_none());
}
