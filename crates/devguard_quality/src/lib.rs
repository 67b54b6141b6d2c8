//! Quality guardian: code smell detectors, circular-dependency detection,
//! and technical debt scoring, all operating over `devguard_storage` state
//! populated by `devguard_analyzer`.

pub mod cycles;
pub mod debt;
pub mod detectors;

use devguard_storage::types::{DebtSnapshot, QualityIssue};
use devguard_storage::Store;

pub struct QualityReport {
    pub issues: Vec<QualityIssue>,
    pub snapshot: DebtSnapshot,
}

/// Runs every detector, records findings (deduped by fingerprint), takes a
/// fresh debt snapshot, and persists it. This is the operation behind the
/// `assess_code_quality` and `calculate_technical_debt` tools.
pub async fn assess_quality(store: &Store, project_id: &str) -> anyhow::Result<QualityReport> {
    let issues = detectors::run_all_detectors(store, project_id).await?;
    for issue in &issues {
        store.record_quality_issue(issue).await?;
    }

    let snapshot = debt::compute_debt_snapshot(store, project_id).await?;
    store.insert_debt_snapshot(&snapshot).await?;

    Ok(QualityReport { issues, snapshot })
}

/// Files ranked by summed open-issue severity weight, each with its top-3
/// issue titles, for `identify_debt_hotspots`.
pub async fn debt_hotspots(
    store: &Store,
    project_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<(String, f64, Vec<String>)>> {
    Ok(store.hotspot_files(project_id, limit).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devguard_storage::types::{CodeEntity, EntityKind, Project};
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn assess_quality_detects_and_persists_a_snapshot() {
        let store = Store::open("sqlite::memory:").await.unwrap();
        store
            .upsert_project(&Project {
                project_id: "p1".into(),
                name: "demo".into(),
                path: "/src".into(),
                language: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .insert_entity(&CodeEntity {
                entity_id: "e1".into(),
                project_id: "p1".into(),
                kind: EntityKind::Function,
                name: "monolith".into(),
                qualified_name: "m.monolith".into(),
                file_path: "m.py".into(),
                line_start: 1,
                line_end: Some(300),
                signature: None,
                docstring: None,
                parent_id: None,
                metadata: json!({}),
            })
            .await
            .unwrap();

        let report = assess_quality(&store, "p1").await.unwrap();
        assert!(report.issues.iter().any(|i| i.issue_type == "long_function"));
        assert!(store.latest_debt_snapshot("p1").await.unwrap().is_some());
    }
}
