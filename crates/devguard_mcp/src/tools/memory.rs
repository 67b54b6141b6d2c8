//! `store_memory` / `retrieve_memory`: a lightweight memory layer over the
//! project-context note store (no embeddings/vector DB — that's an explicit
//! Non-goal). `memory_level` is stored as a note tag and maps to an
//! importance weight so `retrieve_memory`'s ranking favors `long`-lived
//! memories over `short`-lived scratch notes.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{opt_i64, require_str, McpTool};
use crate::state::AppState;

fn level_importance(level: &str) -> i64 {
    match level {
        "short" => 2,
        "long" => 5,
        _ => 3, // mid, or anything unrecognized
    }
}

pub struct StoreMemoryTool;

#[async_trait]
impl McpTool for StoreMemoryTool {
    fn name(&self) -> &'static str {
        "store_memory"
    }

    fn description(&self) -> &'static str {
        "Store a piece of project memory (short/mid/long-lived) for later retrieval"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "content": {"type": "string"},
                "memory_level": {"type": "string", "enum": ["short", "mid", "long"], "default": "mid"}
            },
            "required": ["project_id", "content"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let content = require_str(&args, "content")?;
        let level = args.get("memory_level").and_then(Value::as_str).unwrap_or("mid");

        let note = devguard_context::notes::add_project_note(
            &state.store,
            project_id,
            None,
            "memory",
            content.chars().take(60).collect::<String>().as_str(),
            content,
            level_importance(level),
            None,
            Vec::new(),
            vec![level.to_string()],
        )
        .await?;

        Ok(json!({"memory_id": note.note_id, "memory_level": level}))
    }
}

pub struct RetrieveMemoryTool;

#[async_trait]
impl McpTool for RetrieveMemoryTool {
    fn name(&self) -> &'static str {
        "retrieve_memory"
    }

    fn description(&self) -> &'static str {
        "Retrieve stored project memories ranked by keyword overlap with a query"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "query": {"type": "string"},
                "top_k": {"type": "integer", "default": 5}
            },
            "required": ["project_id", "query"]
        })
    }

    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let query = require_str(&args, "query")?;
        let top_k = opt_i64(&args, "top_k").unwrap_or(5).max(1) as usize;

        let notes = devguard_context::notes::list_project_notes(&state.store, project_id, Some("memory"), false).await?;

        let query_words: Vec<String> = query.to_lowercase().split_whitespace().map(str::to_string).collect();
        let mut scored: Vec<(f64, &devguard_storage::types::Note)> = notes
            .iter()
            .map(|note| {
                let haystack = note.content.to_lowercase();
                let overlap = query_words.iter().filter(|w| haystack.contains(w.as_str())).count() as f64;
                let score = overlap + note.importance as f64 * 0.1;
                (score, note)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        let memories: Vec<Value> = scored
            .into_iter()
            .take(top_k)
            .map(|(score, note)| {
                let level = note.tags.first().cloned().unwrap_or_else(|| "mid".to_string());
                json!({
                    "memory_id": note.note_id,
                    "content": note.content,
                    "memory_level": level,
                    "relevance": score,
                })
            })
            .collect();

        Ok(json!({"memories": memories}))
    }
}
