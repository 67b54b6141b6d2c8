//! The four code smell detectors. Each walks `devguard_storage` state for
//! one project and returns `QualityIssue`s ready for `Store::record_quality_issue`
//! (which itself handles re-run dedup by fingerprint).

use chrono::Utc;
use devguard_storage::types::{CodeEntity, EntityKind, QualityIssue, RelationKind, Severity};
use devguard_storage::Store;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

use crate::cycles::Graph;

const LONG_FUNCTION_MEDIUM: i64 = 50;
const LONG_FUNCTION_HIGH: i64 = 100;
const LONG_FUNCTION_CRITICAL: i64 = 200;

const GOD_CLASS_MEDIUM_METHODS: usize = 15;
const GOD_CLASS_MEDIUM_LOC: i64 = 300;
const GOD_CLASS_HIGH_METHODS: usize = 20;
const GOD_CLASS_HIGH_LOC: i64 = 500;
const GOD_CLASS_CRITICAL_METHODS: usize = 30;
const GOD_CLASS_CRITICAL_LOC: i64 = 800;

const TIGHT_COUPLING_MEDIUM: usize = 10;
const TIGHT_COUPLING_HIGH: usize = 20;

fn new_issue(
    project_id: &str,
    issue_type: &str,
    severity: Severity,
    entity_id: Option<String>,
    file_path: Option<String>,
    line_number: Option<i64>,
    title: String,
    description: Option<String>,
    suggestion: Option<String>,
    metadata: serde_json::Value,
) -> QualityIssue {
    QualityIssue {
        issue_id: Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        issue_type: issue_type.to_string(),
        severity,
        entity_id,
        file_path,
        line_number,
        title,
        description,
        suggestion,
        metadata,
        status: devguard_storage::types::IssueStatus::Open,
        detected_at: Utc::now(),
        resolved_at: None,
        resolved_by: None,
    }
}

pub async fn detect_circular_dependencies(
    store: &Store,
    project_id: &str,
) -> anyhow::Result<Vec<QualityIssue>> {
    let relations = store
        .relations_of_kind(project_id, RelationKind::Imports)
        .await?;
    let entities = store.list_entities(project_id, None, None).await?;
    let by_id: HashMap<&str, &CodeEntity> =
        entities.iter().map(|e| (e.entity_id.as_str(), e)).collect();

    let mut graph = Graph::new();
    for rel in &relations {
        let Some(target_id) = &rel.target_id else {
            continue;
        };
        let Some(source_file) = rel.file_path.as_deref() else {
            continue;
        };
        let Some(target_entity) = by_id.get(target_id.as_str()) else {
            continue;
        };
        graph.add_edge(source_file, &target_entity.file_path);
    }

    let mut issues = Vec::new();
    for cycle in graph.cycles() {
        let severity = if cycle.len() <= 3 {
            Severity::High
        } else {
            Severity::Critical
        };
        issues.push(new_issue(
            project_id,
            "circular_dependency",
            severity,
            None,
            cycle.first().cloned(),
            None,
            format!("Circular import among {} files", cycle.len()),
            Some(format!("Cycle: {}", cycle.join(" -> "))),
            Some("Break the cycle by extracting the shared code into a new module".to_string()),
            json!({ "files": cycle }),
        ));
    }
    Ok(issues)
}

pub async fn detect_long_functions(
    store: &Store,
    project_id: &str,
) -> anyhow::Result<Vec<QualityIssue>> {
    let functions = store.list_entities(project_id, None, None).await?;
    let mut issues = Vec::new();

    for entity in functions
        .iter()
        .filter(|e| matches!(e.kind, EntityKind::Function | EntityKind::Method))
    {
        let Some(line_end) = entity.line_end else {
            continue;
        };
        let loc = line_end - entity.line_start + 1;
        let severity = if loc > LONG_FUNCTION_CRITICAL {
            Severity::Critical
        } else if loc > LONG_FUNCTION_HIGH {
            Severity::High
        } else if loc > LONG_FUNCTION_MEDIUM {
            Severity::Medium
        } else {
            continue;
        };

        issues.push(new_issue(
            project_id,
            "long_function",
            severity,
            Some(entity.entity_id.clone()),
            Some(entity.file_path.clone()),
            Some(entity.line_start),
            format!("{} is {} lines long", entity.name, loc),
            None,
            Some("Split into smaller, single-purpose functions".to_string()),
            json!({ "loc": loc }),
        ));
    }
    Ok(issues)
}

pub async fn detect_god_classes(
    store: &Store,
    project_id: &str,
) -> anyhow::Result<Vec<QualityIssue>> {
    let entities = store.list_entities(project_id, None, None).await?;
    let classes = entities.iter().filter(|e| e.kind == EntityKind::Class);
    let mut issues = Vec::new();

    for class in classes {
        let methods: Vec<&CodeEntity> = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Method && e.parent_id.as_deref() == Some(&class.entity_id))
            .collect();
        let method_count = methods.len();
        let loc = class.line_end.unwrap_or(class.line_start) - class.line_start + 1;

        let severity = if method_count > GOD_CLASS_CRITICAL_METHODS || loc > GOD_CLASS_CRITICAL_LOC
        {
            Severity::Critical
        } else if method_count > GOD_CLASS_HIGH_METHODS || loc > GOD_CLASS_HIGH_LOC {
            Severity::High
        } else if method_count > GOD_CLASS_MEDIUM_METHODS || loc > GOD_CLASS_MEDIUM_LOC {
            Severity::Medium
        } else {
            continue;
        };

        issues.push(new_issue(
            project_id,
            "god_class",
            severity,
            Some(class.entity_id.clone()),
            Some(class.file_path.clone()),
            Some(class.line_start),
            format!("{} has {} methods across {} lines", class.name, method_count, loc),
            None,
            Some("Split responsibilities into smaller collaborating classes".to_string()),
            json!({ "method_count": method_count, "loc": loc }),
        ));
    }
    Ok(issues)
}

pub async fn detect_tight_coupling(
    store: &Store,
    project_id: &str,
) -> anyhow::Result<Vec<QualityIssue>> {
    let entities = store.list_entities(project_id, None, None).await?;
    let all_relations = store.all_relations(project_id).await?;

    let mut fan_out: HashMap<&str, usize> = HashMap::new();
    let mut fan_in: HashMap<&str, usize> = HashMap::new();
    for rel in &all_relations {
        if !matches!(rel.kind, RelationKind::Calls | RelationKind::Imports) {
            continue;
        }
        *fan_out.entry(rel.source_id.as_str()).or_insert(0) += 1;
        if let Some(target) = &rel.target_id {
            *fan_in.entry(target.as_str()).or_insert(0) += 1;
        }
    }

    let mut issues = Vec::new();
    for entity in &entities {
        let out = fan_out.get(entity.entity_id.as_str()).copied().unwrap_or(0);
        let inn = fan_in.get(entity.entity_id.as_str()).copied().unwrap_or(0);
        let worst = out.max(inn);

        let severity = if worst > TIGHT_COUPLING_HIGH {
            Severity::High
        } else if worst > TIGHT_COUPLING_MEDIUM {
            Severity::Medium
        } else {
            continue;
        };

        issues.push(new_issue(
            project_id,
            "tight_coupling",
            severity,
            Some(entity.entity_id.clone()),
            Some(entity.file_path.clone()),
            Some(entity.line_start),
            format!("{} has fan-in {} / fan-out {}", entity.name, inn, out),
            None,
            Some("Introduce an interface/seam to reduce direct dependencies".to_string()),
            json!({ "fan_in": inn, "fan_out": out }),
        ));
    }
    Ok(issues)
}

pub async fn run_all_detectors(
    store: &Store,
    project_id: &str,
) -> anyhow::Result<Vec<QualityIssue>> {
    let mut issues = Vec::new();
    issues.extend(detect_circular_dependencies(store, project_id).await?);
    issues.extend(detect_long_functions(store, project_id).await?);
    issues.extend(detect_god_classes(store, project_id).await?);
    issues.extend(detect_tight_coupling(store, project_id).await?);
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devguard_storage::types::Project;

    async fn store_with_long_function() -> Store {
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
                name: "do_everything".into(),
                qualified_name: "m.do_everything".into(),
                file_path: "m.py".into(),
                line_start: 1,
                line_end: Some(250),
                signature: None,
                docstring: None,
                parent_id: None,
                metadata: json!({}),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn flags_critically_long_function() {
        let store = store_with_long_function().await;
        let issues = detect_long_functions(&store, "p1").await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn exactly_fifty_lines_is_not_flagged() {
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
                name: "just_fine".into(),
                qualified_name: "m.just_fine".into(),
                file_path: "m.py".into(),
                line_start: 1,
                line_end: Some(50),
                signature: None,
                docstring: None,
                parent_id: None,
                metadata: json!({}),
            })
            .await
            .unwrap();

        let issues = detect_long_functions(&store, "p1").await.unwrap();
        assert!(issues.is_empty());
    }
}
