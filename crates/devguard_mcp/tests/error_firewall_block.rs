//! End-to-end: recording an error pattern once, then having the firewall
//! block a matching operation and let a near-miss through.

use devguard_mcp::config::ServerConfig;
use devguard_mcp::state::AppState;
use devguard_storage::types::BlockLevel;
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
async fn recorded_block_pattern_blocks_a_match_and_ignores_a_near_miss() {
    let state = memory_state().await;
    let pattern = json!({"device_name": "iPhone 15", "os_version": "17.0"});

    let recorded = devguard_firewall::record_error(
        &state.store,
        "ios_build",
        "building for a device without provisioning profile entitlements",
        &pattern,
        "xcodebuild exited with CODE_SIGNING_REQUIRED",
        Some("install the provisioning profile before building"),
        0.9,
        BlockLevel::Block,
        false,
    )
    .await
    .unwrap();
    assert!(recorded.is_new);

    let matching = json!({"device_name": "iPhone 15", "os_version": "17.0"});
    let result = devguard_firewall::check_operation(&state.store, "ios_build", &matching, None)
        .await
        .unwrap();
    assert!(result.should_block);
    let matched = result.matched_error.expect("a match was recorded");
    assert_eq!(matched.match_confidence, 1.0);
    assert_eq!(matched.error_id, recorded.error_id);

    let record = state
        .store
        .get_error_record_by_error_id(&recorded.error_id)
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.blocked_count, 1);

    let near_miss = json!({"device_name": "iPhone 15"});
    let result = devguard_firewall::check_operation(&state.store, "ios_build", &near_miss, None)
        .await
        .unwrap();
    assert!(!result.should_block);
    assert!(result.matched_error.is_none());

    let record = state
        .store
        .get_error_record_by_error_id(&recorded.error_id)
        .await
        .unwrap()
        .expect("record exists");
    assert_eq!(record.blocked_count, 1, "near-miss below threshold must not increment blocked_count");
}
