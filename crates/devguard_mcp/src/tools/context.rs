//! Project-context tools: sessions, decisions, notes, todos.

use async_trait::async_trait;
use devguard_storage::types::{DecisionStatus, TodoStatus};
use serde_json::{json, Value};

use super::{opt_bool, opt_f64, opt_i64, opt_str, opt_str_vec, require_str, McpTool};
use crate::state::AppState;

pub struct StartDevSessionTool;

#[async_trait]
impl McpTool for StartDevSessionTool {
    fn name(&self) -> &'static str {
        "start_dev_session"
    }
    fn description(&self) -> &'static str {
        "Start a development session for a project"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}, "goals": {"type": "string"}}, "required": ["project_id", "goals"]})
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let goals = require_str(&args, "goals")?;
        let session = devguard_context::sessions::start_session(&state.store, project_id, goals).await?;
        Ok(serde_json::to_value(session)?)
    }
}

pub struct EndDevSessionTool;

#[async_trait]
impl McpTool for EndDevSessionTool {
    fn name(&self) -> &'static str {
        "end_dev_session"
    }
    fn description(&self) -> &'static str {
        "Close a development session, recording what was achieved"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {"type": "string"},
                "achievements": {"type": "string"},
                "next_steps": {"type": "string"},
                "files_modified": {"type": "array", "items": {"type": "string"}},
                "issues_encountered": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["session_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let session_id = require_str(&args, "session_id")?;
        let files_modified = opt_str_vec(&args, "files_modified");
        let issues = opt_str_vec(&args, "issues_encountered");
        let session = devguard_context::sessions::end_session(
            &state.store,
            session_id,
            opt_str(&args, "achievements"),
            opt_str(&args, "next_steps"),
            &files_modified,
            &issues,
        )
        .await?;
        Ok(serde_json::to_value(session)?)
    }
}

pub struct RecordDesignDecisionTool;

#[async_trait]
impl McpTool for RecordDesignDecisionTool {
    fn name(&self) -> &'static str {
        "record_design_decision"
    }
    fn description(&self) -> &'static str {
        "Record an architectural or design decision, optionally superseding a prior one"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "session_id": {"type": "string"},
                "category": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "reasoning": {"type": "string"},
                "alternatives": {"type": "array", "items": {"type": "string"}},
                "trade_offs": {"type": "object"},
                "impact_scope": {"type": "string"},
                "supersedes": {"type": "string"}
            },
            "required": ["project_id", "category", "title", "reasoning"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let category = require_str(&args, "category")?;
        let title = require_str(&args, "title")?;
        let reasoning = require_str(&args, "reasoning")?;
        let alternatives = opt_str_vec(&args, "alternatives");
        let trade_offs = args.get("trade_offs").cloned().unwrap_or_else(|| json!({}));

        let decision = devguard_context::decisions::record_design_decision(
            &state.store,
            project_id,
            opt_str(&args, "session_id"),
            category,
            title,
            opt_str(&args, "description"),
            reasoning,
            alternatives,
            trade_offs,
            opt_str(&args, "impact_scope"),
            opt_str(&args, "supersedes"),
        )
        .await?;
        Ok(serde_json::to_value(decision)?)
    }
}

pub struct SupersedeDecisionTool;

#[async_trait]
impl McpTool for SupersedeDecisionTool {
    fn name(&self) -> &'static str {
        "supersede_decision"
    }
    fn description(&self) -> &'static str {
        "Mark an existing design decision as superseded by another existing decision"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "old_id": {"type": "string"},
                "new_id": {"type": "string"}
            },
            "required": ["old_id", "new_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let old_id = require_str(&args, "old_id")?;
        let new_id = require_str(&args, "new_id")?;
        let decision = devguard_context::decisions::supersede(&state.store, old_id, new_id).await?;
        Ok(serde_json::to_value(decision)?)
    }
}

pub struct AddProjectNoteTool;

#[async_trait]
impl McpTool for AddProjectNoteTool {
    fn name(&self) -> &'static str {
        "add_project_note"
    }
    fn description(&self) -> &'static str {
        "Add a note (pitfall, tip, optimization, issue, or reminder) to a project"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "session_id": {"type": "string"},
                "category": {"type": "string"},
                "title": {"type": "string"},
                "content": {"type": "string"},
                "importance": {"type": "integer", "default": 3},
                "related_code": {"type": "string"},
                "related_entities": {"type": "array", "items": {"type": "string"}},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["project_id", "category", "title", "content"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let category = require_str(&args, "category")?;
        let title = require_str(&args, "title")?;
        let content = require_str(&args, "content")?;
        let importance = opt_i64(&args, "importance").unwrap_or(3);

        let note = devguard_context::notes::add_project_note(
            &state.store,
            project_id,
            opt_str(&args, "session_id"),
            category,
            title,
            content,
            importance,
            opt_str(&args, "related_code"),
            opt_str_vec(&args, "related_entities"),
            opt_str_vec(&args, "tags"),
        )
        .await?;
        Ok(serde_json::to_value(note)?)
    }
}

pub struct CreateTodoTool;

#[async_trait]
impl McpTool for CreateTodoTool {
    fn name(&self) -> &'static str {
        "create_todo"
    }
    fn description(&self) -> &'static str {
        "Create a TODO item, optionally depending on other (already existing) todos"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "session_id": {"type": "string"},
                "title": {"type": "string"},
                "description": {"type": "string"},
                "category": {"type": "string"},
                "priority": {"type": "integer", "default": 3},
                "estimated_difficulty": {"type": "integer", "default": 3},
                "estimated_hours": {"type": "number"},
                "depends_on": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["project_id", "title", "category"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let title = require_str(&args, "title")?;
        let category = require_str(&args, "category")?;
        let priority = opt_i64(&args, "priority").unwrap_or(3);
        let difficulty = opt_i64(&args, "estimated_difficulty").unwrap_or(3);

        let todo = devguard_context::todos::create_todo(
            &state.store,
            project_id,
            opt_str(&args, "session_id"),
            title,
            opt_str(&args, "description"),
            category,
            priority,
            difficulty,
            opt_f64(&args, "estimated_hours"),
            opt_str_vec(&args, "depends_on"),
        )
        .await?;
        Ok(serde_json::to_value(todo)?)
    }
}

pub struct UpdateTodoStatusTool;

#[async_trait]
impl McpTool for UpdateTodoStatusTool {
    fn name(&self) -> &'static str {
        "update_todo_status"
    }
    fn description(&self) -> &'static str {
        "Update a TODO's status, progress, and completion note"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "todo_id": {"type": "string"},
                "status": {"type": "string", "enum": ["pending", "in_progress", "blocked", "completed", "cancelled"]},
                "progress": {"type": "integer", "default": 0},
                "completion_note": {"type": "string"}
            },
            "required": ["todo_id", "status"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let todo_id = require_str(&args, "todo_id")?;
        let status_str = require_str(&args, "status")?;
        let status = TodoStatus::parse(status_str)
            .ok_or_else(|| anyhow::anyhow!("invalid status `{status_str}`"))?;
        let progress = opt_i64(&args, "progress").unwrap_or(0);

        let todo = devguard_context::todos::update_todo_status(
            &state.store,
            todo_id,
            status,
            progress,
            opt_str(&args, "completion_note"),
        )
        .await?;
        Ok(serde_json::to_value(todo)?)
    }
}

pub struct GetProjectContextTool;

#[async_trait]
impl McpTool for GetProjectContextTool {
    fn name(&self) -> &'static str {
        "get_project_context"
    }
    fn description(&self) -> &'static str {
        "Summarize a project's latest session, open decisions, notes and next TODO"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}}, "required": ["project_id"]})
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let context = devguard_context::context::get_project_context(&state.store, project_id).await?;
        Ok(serde_json::to_value(context)?)
    }
}

pub struct ListTodosTool;

#[async_trait]
impl McpTool for ListTodosTool {
    fn name(&self) -> &'static str {
        "list_todos"
    }
    fn description(&self) -> &'static str {
        "List TODOs for a project, optionally filtered by status or category"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "status": {"type": "string"}, "category": {"type": "string"}},
            "required": ["project_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let status = opt_str(&args, "status").and_then(TodoStatus::parse);
        let todos = devguard_context::todos::list_todos(&state.store, project_id, status, opt_str(&args, "category")).await?;
        Ok(json!({"todos": todos}))
    }
}

pub struct GetNextTodoTool;

#[async_trait]
impl McpTool for GetNextTodoTool {
    fn name(&self) -> &'static str {
        "get_next_todo"
    }
    fn description(&self) -> &'static str {
        "Return the highest-priority pending TODO whose dependencies are all complete"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}}, "required": ["project_id"]})
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let todo = devguard_context::todos::get_next_todo(&state.store, project_id).await?;
        Ok(json!({"todo": todo}))
    }
}

pub struct ListDesignDecisionsTool;

#[async_trait]
impl McpTool for ListDesignDecisionsTool {
    fn name(&self) -> &'static str {
        "list_design_decisions"
    }
    fn description(&self) -> &'static str {
        "List design decisions for a project, optionally filtered by category or status"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "category": {"type": "string"}, "status": {"type": "string"}},
            "required": ["project_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let status = opt_str(&args, "status").and_then(DecisionStatus::parse);
        let decisions =
            devguard_context::decisions::list_decisions(&state.store, project_id, opt_str(&args, "category"), status).await?;
        Ok(json!({"decisions": decisions}))
    }
}

pub struct ListProjectNotesTool;

#[async_trait]
impl McpTool for ListProjectNotesTool {
    fn name(&self) -> &'static str {
        "list_project_notes"
    }
    fn description(&self) -> &'static str {
        "List notes for a project, optionally filtered by category or unresolved-only"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "category": {"type": "string"}, "unresolved_only": {"type": "boolean"}},
            "required": ["project_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let unresolved_only = opt_bool(&args, "unresolved_only").unwrap_or(false);
        let notes = devguard_context::notes::list_project_notes(&state.store, project_id, opt_str(&args, "category"), unresolved_only).await?;
        Ok(json!({"notes": notes}))
    }
}

pub struct GetProjectStatisticsTool;

#[async_trait]
impl McpTool for GetProjectStatisticsTool {
    fn name(&self) -> &'static str {
        "get_project_statistics"
    }
    fn description(&self) -> &'static str {
        "Return counts of sessions, decisions, notes, todos, and entities for a project"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}}, "required": ["project_id"]})
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let stats = devguard_context::context::get_project_statistics(&state.store, project_id).await?;
        Ok(serde_json::to_value(stats)?)
    }
}
