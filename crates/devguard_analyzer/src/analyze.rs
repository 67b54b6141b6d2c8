//! Orchestrates discovery + per-file parsing + cross-file resolution.

use devguard_storage::types::{CodeEntity, CodeRelation};
use devguard_storage::Store;
use serde::Serialize;
use std::path::Path;

use crate::discovery::{self, Language};
use crate::model::FileAnalysis;
use crate::{js_ts, python};

#[derive(Debug, Default, Serialize)]
pub struct AnalysisSummary {
    pub files_analyzed: usize,
    pub files_failed: usize,
    pub entities_found: usize,
    pub relations_found: usize,
    pub relations_resolved: usize,
}

pub async fn analyze_codebase(
    store: &Store,
    project_id: &str,
    project_root: &Path,
) -> anyhow::Result<AnalysisSummary> {
    let files = discovery::discover(project_root);
    let mut summary = AnalysisSummary::default();

    // (relation needing resolution, candidate file path for relative lookup)
    let mut pending_relations: Vec<CodeRelation> = Vec::new();
    let mut seen_paths: std::collections::HashSet<String> = std::collections::HashSet::new();

    for file in &files {
        let rel_path = file
            .path
            .strip_prefix(project_root)
            .unwrap_or(&file.path)
            .to_string_lossy()
            .replace('\\', "/");

        let source = match std::fs::read_to_string(&file.path) {
            Ok(s) => s,
            Err(_) => {
                summary.files_failed += 1;
                continue;
            }
        };

        let analysis = match parse_file(&source, &rel_path, file.language) {
            Ok(a) => a,
            Err(_) => {
                summary.files_failed += 1;
                continue;
            }
        };

        store
            .delete_entities_for_file(project_id, &rel_path)
            .await?;
        store
            .delete_relations_for_file(project_id, &rel_path)
            .await?;

        persist_file(store, project_id, &analysis, &mut pending_relations).await?;
        summary.files_analyzed += 1;
        summary.entities_found += analysis.entities.len();
        summary.relations_found += analysis.relations.len();
        seen_paths.insert(rel_path);
    }

    for stale_path in store.distinct_entity_file_paths(project_id).await? {
        if !seen_paths.contains(&stale_path) {
            store.delete_entities_for_file(project_id, &stale_path).await?;
            store.delete_relations_for_file(project_id, &stale_path).await?;
        }
    }

    summary.relations_resolved = resolve_relations(store, project_id, &pending_relations).await?;
    Ok(summary)
}

fn parse_file(source: &str, rel_path: &str, language: Language) -> anyhow::Result<FileAnalysis> {
    match language {
        Language::Python => python::analyze(source, rel_path),
        other => Ok(js_ts::analyze(source, rel_path, other)),
    }
}

async fn persist_file(
    store: &Store,
    project_id: &str,
    analysis: &FileAnalysis,
    pending_relations: &mut Vec<CodeRelation>,
) -> anyhow::Result<()> {
    for e in &analysis.entities {
        store
            .insert_entity(&CodeEntity {
                entity_id: e.entity_id.clone(),
                project_id: project_id.to_string(),
                kind: e.kind,
                name: e.name.clone(),
                qualified_name: e.qualified_name.clone(),
                file_path: e.file_path.clone(),
                line_start: e.line_start,
                line_end: e.line_end,
                signature: e.signature.clone(),
                docstring: e.docstring.clone(),
                parent_id: e.parent_id.clone(),
                metadata: e.metadata.clone(),
            })
            .await?;
    }

    for r in &analysis.relations {
        // "contains"/"inherits" relations already name an entity id as their
        // target (emitted that way by the per-file analyzers); everything
        // else (calls, imports) names a bare identifier/module path that
        // needs cross-file resolution.
        let already_resolved = store.get_entity(&r.target_name).await?.is_some();
        let target_id = if already_resolved {
            Some(r.target_name.clone())
        } else {
            None
        };

        let mut metadata = r.metadata.clone();
        if target_id.is_none() {
            if let Some(obj) = metadata.as_object_mut() {
                obj.insert("target_name".to_string(), r.target_name.clone().into());
            }
        }

        let relation = CodeRelation {
            relation_id: r.relation_id.clone(),
            project_id: project_id.to_string(),
            source_id: r.source_id.clone(),
            target_id,
            kind: r.kind,
            file_path: r.file_path.clone(),
            metadata,
        };
        store.insert_relation(&relation).await?;
        if relation.target_id.is_none() {
            pending_relations.push(relation);
        }
    }
    Ok(())
}

/// Second pass: match each unresolved relation's original target name
/// (recovered from metadata/target hints) against entity names in the
/// project. Calls resolve by bare function/method name; imports resolve by
/// matching a project-relative file path derived from the module specifier.
async fn resolve_relations(
    store: &Store,
    project_id: &str,
    pending: &[CodeRelation],
) -> anyhow::Result<usize> {
    let mut resolved = 0;
    for relation in pending {
        let candidates = store
            .find_entities_by_name(project_id, &relation_lookup_key(relation))
            .await?;
        let Some(best) = candidates.into_iter().next() else {
            continue;
        };
        store
            .resolve_relation_target(&relation.relation_id, &best.entity_id)
            .await?;
        resolved += 1;
    }
    Ok(resolved)
}

fn relation_lookup_key(relation: &CodeRelation) -> String {
    relation
        .metadata
        .get("target_name")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_default()
}
