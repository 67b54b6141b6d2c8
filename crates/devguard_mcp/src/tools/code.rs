//! Code analyzer tools: run the analyzer and query the entity/relation graph
//! it populates.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use devguard_storage::types::{EntityKind, Project, RelationKind};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{opt_i64, opt_str, require_str, McpTool};
use crate::state::AppState;

async fn resolve_project(state: &AppState, project_path: &str, project_id: Option<&str>) -> anyhow::Result<String> {
    if let Some(id) = project_id {
        if state.store.get_project(id).await?.is_none() {
            let name = PathBuf::from(project_path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| project_path.to_string());
            state
                .store
                .upsert_project(&Project {
                    project_id: id.to_string(),
                    name,
                    path: project_path.to_string(),
                    language: None,
                    created_at: Utc::now(),
                })
                .await?;
        }
        return Ok(id.to_string());
    }

    if let Some(existing) = state.store.find_project_by_path(project_path).await? {
        return Ok(existing.project_id);
    }

    let id = Uuid::new_v4().to_string();
    let name = PathBuf::from(project_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| project_path.to_string());
    state
        .store
        .upsert_project(&Project {
            project_id: id.clone(),
            name,
            path: project_path.to_string(),
            language: None,
            created_at: Utc::now(),
        })
        .await?;
    Ok(id)
}

pub struct AnalyzeCodebaseTool;

#[async_trait]
impl McpTool for AnalyzeCodebaseTool {
    fn name(&self) -> &'static str {
        "analyze_codebase"
    }

    fn description(&self) -> &'static str {
        "Walk a project directory and index its code entities and relations"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_path": {"type": "string"},
                "project_id": {"type": "string"}
            },
            "required": ["project_path"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_path = require_str(&args, "project_path")?;
        let project_id = resolve_project(state, project_path, opt_str(&args, "project_id")).await?;

        let summary = devguard_analyzer::analyze_codebase(&state.store, &project_id, &PathBuf::from(project_path)).await?;
        Ok(json!({"project_id": project_id, "summary": summary}))
    }
}

pub struct QueryArchitectureTool;

#[async_trait]
impl McpTool for QueryArchitectureTool {
    fn name(&self) -> &'static str {
        "query_architecture"
    }

    fn description(&self) -> &'static str {
        "Summarize a project's modules, classes, and relation counts"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}}, "required": ["project_id"]})
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let entities = state.store.list_entities(project_id, None, None).await?;
        let relations = state.store.all_relations(project_id).await?;

        let mut by_kind: HashMap<&'static str, usize> = HashMap::new();
        for e in &entities {
            *by_kind.entry(e.kind.as_str()).or_insert(0) += 1;
        }
        let mut relations_by_kind: HashMap<&'static str, usize> = HashMap::new();
        for r in &relations {
            *relations_by_kind.entry(r.kind.as_str()).or_insert(0) += 1;
        }
        let modules: Vec<&str> = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Module)
            .map(|e| e.file_path.as_str())
            .collect();

        Ok(json!({
            "entity_count": entities.len(),
            "entities_by_kind": by_kind,
            "relation_count": relations.len(),
            "relations_by_kind": relations_by_kind,
            "modules": modules,
        }))
    }
}

pub struct FindEntityTool;

#[async_trait]
impl McpTool for FindEntityTool {
    fn name(&self) -> &'static str {
        "find_entity"
    }

    fn description(&self) -> &'static str {
        "Find code entities by name, exact or fuzzy (substring) match"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "name": {"type": "string"},
                "fuzzy": {"type": "boolean", "default": true}
            },
            "required": ["project_id", "name"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let name = require_str(&args, "name")?;
        let fuzzy = args.get("fuzzy").and_then(Value::as_bool).unwrap_or(true);

        let entities = if fuzzy {
            state.store.find_entities_by_name(project_id, name).await?
        } else {
            state
                .store
                .list_entities(project_id, None, None)
                .await?
                .into_iter()
                .filter(|e| e.name == name || e.qualified_name == name)
                .collect()
        };

        Ok(json!({"entities": entities}))
    }
}

pub struct TraceFunctionCallsTool;

#[async_trait]
impl McpTool for TraceFunctionCallsTool {
    fn name(&self) -> &'static str {
        "trace_function_calls"
    }

    fn description(&self) -> &'static str {
        "Trace the call graph outward from an entity up to a given depth"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "entity_id": {"type": "string"},
                "depth": {"type": "integer", "default": 3}
            },
            "required": ["project_id", "entity_id"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let entity_id = require_str(&args, "entity_id")?;
        let depth = opt_i64(&args, "depth").unwrap_or(3).max(0) as usize;

        let mut visited = HashSet::new();
        let mut frontier = vec![entity_id.to_string()];
        let mut edges = Vec::new();
        visited.insert(entity_id.to_string());

        for _ in 0..depth {
            let mut next = Vec::new();
            for id in &frontier {
                let relations = state.store.relations_from(project_id, id).await?;
                for r in relations.into_iter().filter(|r| r.kind == RelationKind::Calls) {
                    if let Some(target) = r.target_id.clone() {
                        edges.push(json!({"from": id, "to": target, "file_path": r.file_path}));
                        if visited.insert(target.clone()) {
                            next.push(target);
                        }
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(json!({"root": entity_id, "depth": depth, "calls": edges}))
    }
}

pub struct FindDependenciesTool;

#[async_trait]
impl McpTool for FindDependenciesTool {
    fn name(&self) -> &'static str {
        "find_dependencies"
    }

    fn description(&self) -> &'static str {
        "List the imports and calls an entity directly depends on"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "entity_id": {"type": "string"}},
            "required": ["project_id", "entity_id"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let entity_id = require_str(&args, "entity_id")?;

        let relations = state.store.relations_from(project_id, entity_id).await?;
        let dependencies: Vec<&devguard_storage::types::CodeRelation> = relations
            .iter()
            .filter(|r| matches!(r.kind, RelationKind::Imports | RelationKind::Calls))
            .collect();

        Ok(json!({"entity_id": entity_id, "dependencies": dependencies}))
    }
}

pub struct ListModulesTool;

#[async_trait]
impl McpTool for ListModulesTool {
    fn name(&self) -> &'static str {
        "list_modules"
    }

    fn description(&self) -> &'static str {
        "List every module entity indexed for a project"
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}}, "required": ["project_id"]})
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let modules = state.store.list_entities(project_id, None, Some(EntityKind::Module)).await?;
        Ok(json!({"modules": modules}))
    }
}

pub struct ExplainModuleTool;

#[async_trait]
impl McpTool for ExplainModuleTool {
    fn name(&self) -> &'static str {
        "explain_module"
    }

    fn description(&self) -> &'static str {
        "Describe a module's entities and its direct import relations"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "file_path": {"type": "string"}},
            "required": ["project_id", "file_path"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let file_path = require_str(&args, "file_path")?;

        let entities = state.store.list_entities(project_id, Some(file_path), None).await?;
        let mut imports = Vec::new();
        for e in &entities {
            let relations = state.store.relations_from(project_id, &e.entity_id).await?;
            imports.extend(relations.into_iter().filter(|r| r.kind == RelationKind::Imports));
        }

        Ok(json!({"file_path": file_path, "entities": entities, "imports": imports}))
    }
}

pub struct SearchCodePatternTool;

#[async_trait]
impl McpTool for SearchCodePatternTool {
    fn name(&self) -> &'static str {
        "search_code_pattern"
    }

    fn description(&self) -> &'static str {
        "Search entity names, qualified names, and signatures for a substring"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "pattern": {"type": "string"}},
            "required": ["project_id", "pattern"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let pattern = require_str(&args, "pattern")?;

        let mut matches = state.store.find_entities_by_name(project_id, pattern).await?;
        let all = state.store.list_entities(project_id, None, None).await?;
        let pattern_lower = pattern.to_lowercase();
        let existing: HashSet<String> = matches.iter().map(|e| e.entity_id.clone()).collect();
        matches.extend(all.into_iter().filter(|e| {
            !existing.contains(&e.entity_id)
                && e.signature
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&pattern_lower))
        }));

        Ok(json!({"matches": matches}))
    }
}
