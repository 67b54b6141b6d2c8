//! Technical debt scoring. Every sub-score is 0-10 (10 = healthiest); the
//! overall score is their weighted average.
//!
//! Weights and formulas:
//!   code_quality_score     10 - (open critical*4 + high*2 + medium*1 + low*0.5) / 10, floored at 0
//!   docs_coverage_score    10 * entities_with_docstring / total_entities
//!   dependency_health_score 10 * resolved_imports / total_imports
//!   todo_debt_score        10 * (1 - overdue_pending / total_todos)
//!   test_coverage_score    constant 5.0 (no coverage instrumentation in this system)
//!   overall_score          0.40*code + 0.25*test + 0.15*docs + 0.10*deps + 0.10*todos
//!   estimated_days_to_fix  (critical*8 + high*4 + medium*2 + low*1) hours, / 8

use chrono::Utc;
use devguard_storage::types::{DebtSnapshot, IssueStatus, RelationKind, Severity, TodoStatus};
use devguard_storage::Store;
use uuid::Uuid;

const TEST_COVERAGE_SCORE: f64 = 5.0;

const WEIGHT_CODE_QUALITY: f64 = 0.40;
const WEIGHT_TEST_COVERAGE: f64 = 0.25;
const WEIGHT_DOCS_COVERAGE: f64 = 0.15;
const WEIGHT_DEPENDENCY_HEALTH: f64 = 0.10;
const WEIGHT_TODO_DEBT: f64 = 0.10;

const CODE_QUALITY_DIVISOR: f64 = 10.0;
const HOURS_PER_DAY: f64 = 8.0;

pub async fn compute_debt_snapshot(store: &Store, project_id: &str) -> anyhow::Result<DebtSnapshot> {
    let issues = store
        .list_quality_issues(project_id, Some(IssueStatus::Open), None, None)
        .await?;
    let entities = store.list_entities(project_id, None, None).await?;
    let imports = store
        .relations_of_kind(project_id, RelationKind::Imports)
        .await?;
    let todos = store.all_todos(project_id).await?;

    let critical_count = issues.iter().filter(|i| i.severity == Severity::Critical).count() as i64;
    let high_count = issues.iter().filter(|i| i.severity == Severity::High).count() as i64;
    let medium_count = issues.iter().filter(|i| i.severity == Severity::Medium).count() as i64;
    let low_count = issues.iter().filter(|i| i.severity == Severity::Low).count() as i64;

    let penalty =
        critical_count as f64 * 4.0 + high_count as f64 * 2.0 + medium_count as f64 + low_count as f64 * 0.5;
    let code_quality_score = (10.0 - penalty / CODE_QUALITY_DIVISOR).clamp(0.0, 10.0);

    let documented = entities.iter().filter(|e| e.docstring.is_some()).count() as f64;
    let docs_coverage_score = if entities.is_empty() {
        10.0
    } else {
        (10.0 * documented / entities.len() as f64).clamp(0.0, 10.0)
    };

    let resolved_imports = imports.iter().filter(|r| r.target_id.is_some()).count() as f64;
    let dependency_health_score = if imports.is_empty() {
        10.0
    } else {
        (10.0 * resolved_imports / imports.len() as f64).clamp(0.0, 10.0)
    };

    let now = Utc::now();
    let overdue_pending = todos
        .iter()
        .filter(|t| t.status == TodoStatus::Pending)
        .filter(|t| (now - t.created_at).num_days() > 30)
        .count() as f64;
    let total_todos = todos.len().max(1) as f64;
    let todo_debt_score = (10.0 * (1.0 - overdue_pending / total_todos)).clamp(0.0, 10.0);

    let overall_score = code_quality_score * WEIGHT_CODE_QUALITY
        + TEST_COVERAGE_SCORE * WEIGHT_TEST_COVERAGE
        + docs_coverage_score * WEIGHT_DOCS_COVERAGE
        + dependency_health_score * WEIGHT_DEPENDENCY_HEALTH
        + todo_debt_score * WEIGHT_TODO_DEBT;

    let estimated_hours =
        critical_count as f64 * 8.0 + high_count as f64 * 4.0 + medium_count as f64 * 2.0 + low_count as f64;
    let estimated_days_to_fix = estimated_hours / HOURS_PER_DAY;

    Ok(DebtSnapshot {
        snapshot_id: Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        overall_score,
        code_quality_score,
        test_coverage_score: TEST_COVERAGE_SCORE,
        docs_coverage_score,
        dependency_health_score,
        todo_debt_score,
        critical_count,
        high_count,
        medium_count,
        low_count,
        estimated_days_to_fix,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use devguard_storage::types::Project;

    #[tokio::test]
    async fn empty_project_scores_perfectly_healthy() {
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

        let snapshot = compute_debt_snapshot(&store, "p1").await.unwrap();
        assert_eq!(snapshot.critical_count, 0);
        assert!(snapshot.overall_score > 9.0);
    }
}
