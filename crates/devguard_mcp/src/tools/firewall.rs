//! Error-firewall tools: record known mistakes, check operations against
//! them before they happen, and inspect the recorded set.

use async_trait::async_trait;
use devguard_storage::types::BlockLevel;
use serde_json::{json, Value};

use super::{opt_bool, opt_f64, opt_str, require_str, McpTool};
use crate::state::AppState;

pub struct ErrorFirewallRecordTool;

#[async_trait]
impl McpTool for ErrorFirewallRecordTool {
    fn name(&self) -> &'static str {
        "error_firewall_record"
    }
    fn description(&self) -> &'static str {
        "Record an error pattern so future matching operations can be warned or blocked"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "error_type": {"type": "string"},
                "error_scene": {"type": "string"},
                "error_pattern": {"type": "object"},
                "error_message": {"type": "string"},
                "solution": {"type": "string"},
                "solution_confidence": {"type": "number", "default": 0.0},
                "block_level": {"type": "string", "enum": ["none", "warning", "block"], "default": "warning"},
                "auto_fix": {"type": "boolean", "default": false}
            },
            "required": ["error_type", "error_scene", "error_pattern", "error_message"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let error_type = require_str(&args, "error_type")?;
        let error_scene = require_str(&args, "error_scene")?;
        let error_pattern = args
            .get("error_pattern")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required argument `error_pattern`"))?;
        let error_message = require_str(&args, "error_message")?;
        let block_level = opt_str(&args, "block_level")
            .and_then(BlockLevel::parse)
            .unwrap_or(BlockLevel::Warning);

        let recorded = devguard_firewall::record_error(
            &state.store,
            error_type,
            error_scene,
            &error_pattern,
            error_message,
            opt_str(&args, "solution"),
            opt_f64(&args, "solution_confidence").unwrap_or(0.0),
            block_level,
            opt_bool(&args, "auto_fix").unwrap_or(false),
        )
        .await?;

        Ok(json!({
            "error_id": recorded.error_id,
            "record_row_id": recorded.record_row_id,
            "is_new": recorded.is_new,
        }))
    }
}

pub struct ErrorFirewallCheckTool;

#[async_trait]
impl McpTool for ErrorFirewallCheckTool {
    fn name(&self) -> &'static str {
        "error_firewall_check"
    }
    fn description(&self) -> &'static str {
        "Check a proposed operation against recorded errors before it runs"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation_type": {"type": "string"},
                "operation_params": {"type": "object"},
                "session_id": {"type": "string"}
            },
            "required": ["operation_type", "operation_params"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let operation_type = require_str(&args, "operation_type")?;
        let operation_params = args
            .get("operation_params")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing required argument `operation_params`"))?;

        let result = devguard_firewall::check_operation(
            &state.store,
            operation_type,
            &operation_params,
            opt_str(&args, "session_id"),
        )
        .await?;
        Ok(serde_json::to_value(result)?)
    }
}

pub struct ErrorFirewallQueryTool;

#[async_trait]
impl McpTool for ErrorFirewallQueryTool {
    fn name(&self) -> &'static str {
        "error_firewall_query"
    }
    fn description(&self) -> &'static str {
        "Look up recorded error patterns by error id or by type"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "error_id": {"type": "string"},
                "error_type": {"type": "string"},
                "error_scene": {"type": "string"}
            }
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        if let Some(error_id) = opt_str(&args, "error_id") {
            let record = state.store.get_error_record_by_error_id(error_id).await?;
            return Ok(json!({"record": record}));
        }

        let error_type = require_str(&args, "error_type")?;
        let records = state
            .store
            .error_records_by_type(error_type, opt_str(&args, "error_scene"))
            .await?;
        Ok(json!({"records": records}))
    }
}

pub struct ErrorFirewallStatsTool;

#[async_trait]
impl McpTool for ErrorFirewallStatsTool {
    fn name(&self) -> &'static str {
        "error_firewall_stats"
    }
    fn description(&self) -> &'static str {
        "Aggregate error-firewall statistics: totals, block rate, recent intercepts"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _args: Value, state: &AppState) -> anyhow::Result<Value> {
        let stats = devguard_firewall::error_firewall_stats(&state.store).await?;
        Ok(serde_json::to_value(stats)?)
    }
}
