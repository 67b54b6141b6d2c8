//! Quality-guardian tools: code smells, technical debt scoring, and
//! quality-issue lifecycle, over `devguard_quality`.

use async_trait::async_trait;
use devguard_storage::types::{IssueStatus, Severity};
use serde_json::{json, Value};

use super::{opt_i64, opt_str, require_str, McpTool};
use crate::state::AppState;

pub struct DetectCodeSmellsTool;

#[async_trait]
impl McpTool for DetectCodeSmellsTool {
    fn name(&self) -> &'static str {
        "detect_code_smells"
    }
    fn description(&self) -> &'static str {
        "Run quality detectors over a project and record any new issues found"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}}, "required": ["project_id"]})
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let report = devguard_quality::assess_quality(&state.store, project_id).await?;
        Ok(json!({"issues": report.issues}))
    }
}

pub struct AssessTechnicalDebtTool;

#[async_trait]
impl McpTool for AssessTechnicalDebtTool {
    fn name(&self) -> &'static str {
        "assess_technical_debt"
    }
    fn description(&self) -> &'static str {
        "Compute a fresh technical-debt snapshot for a project"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"project_id": {"type": "string"}}, "required": ["project_id"]})
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let report = devguard_quality::assess_quality(&state.store, project_id).await?;
        Ok(serde_json::to_value(report.snapshot)?)
    }
}

pub struct IdentifyDebtHotspotsTool;

#[async_trait]
impl McpTool for IdentifyDebtHotspotsTool {
    fn name(&self) -> &'static str {
        "identify_debt_hotspots"
    }
    fn description(&self) -> &'static str {
        "Rank files by open quality-issue severity weight, with each file's top-3 issues"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "limit": {"type": "integer", "default": 10}},
            "required": ["project_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let limit = opt_i64(&args, "limit").unwrap_or(10);
        let hotspots = devguard_quality::debt_hotspots(&state.store, project_id, limit).await?;
        let hotspots: Vec<Value> = hotspots
            .into_iter()
            .map(|(file_path, score, top_issues)| {
                json!({"file_path": file_path, "score": score, "top_issues": top_issues})
            })
            .collect();
        Ok(json!({"hotspots": hotspots}))
    }
}

pub struct GetQualityTrendsTool;

#[async_trait]
impl McpTool for GetQualityTrendsTool {
    fn name(&self) -> &'static str {
        "get_quality_trends"
    }
    fn description(&self) -> &'static str {
        "Return the debt-score history for a project, oldest first"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "limit": {"type": "integer", "default": 20}},
            "required": ["project_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let limit = opt_i64(&args, "limit").unwrap_or(20);
        let history = state.store.debt_snapshot_history(project_id, limit).await?;
        Ok(json!({"history": history}))
    }
}

pub struct ResolveQualityIssueTool;

#[async_trait]
impl McpTool for ResolveQualityIssueTool {
    fn name(&self) -> &'static str {
        "resolve_quality_issue"
    }
    fn description(&self) -> &'static str {
        "Mark a quality issue resolved"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"issue_id": {"type": "string"}, "resolved_by": {"type": "string"}},
            "required": ["issue_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let issue_id = require_str(&args, "issue_id")?;
        state
            .store
            .set_issue_status(issue_id, IssueStatus::Resolved, Some(chrono::Utc::now()), opt_str(&args, "resolved_by"))
            .await?;
        let issue = state.store.require_quality_issue(issue_id).await?;
        Ok(serde_json::to_value(issue)?)
    }
}

pub struct IgnoreQualityIssueTool;

#[async_trait]
impl McpTool for IgnoreQualityIssueTool {
    fn name(&self) -> &'static str {
        "ignore_quality_issue"
    }
    fn description(&self) -> &'static str {
        "Mark a quality issue ignored (won't surface in active hotspots)"
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"issue_id": {"type": "string"}}, "required": ["issue_id"]})
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let issue_id = require_str(&args, "issue_id")?;
        state.store.set_issue_status(issue_id, IssueStatus::Ignored, None, None).await?;
        let issue = state.store.require_quality_issue(issue_id).await?;
        Ok(serde_json::to_value(issue)?)
    }
}

pub struct GenerateQualityReportTool;

#[async_trait]
impl McpTool for GenerateQualityReportTool {
    fn name(&self) -> &'static str {
        "generate_quality_report"
    }
    fn description(&self) -> &'static str {
        "Assess quality and bundle issues, debt snapshot, and hotspots into one report"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"project_id": {"type": "string"}, "hotspot_limit": {"type": "integer", "default": 10}},
            "required": ["project_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let hotspot_limit = opt_i64(&args, "hotspot_limit").unwrap_or(10);

        let report = devguard_quality::assess_quality(&state.store, project_id).await?;
        let hotspots = devguard_quality::debt_hotspots(&state.store, project_id, hotspot_limit).await?;
        let hotspots: Vec<Value> = hotspots
            .into_iter()
            .map(|(file_path, score, top_issues)| {
                json!({"file_path": file_path, "score": score, "top_issues": top_issues})
            })
            .collect();

        Ok(json!({
            "snapshot": report.snapshot,
            "issues": report.issues,
            "hotspots": hotspots,
        }))
    }
}

pub struct ListQualityIssuesTool;

#[async_trait]
impl McpTool for ListQualityIssuesTool {
    fn name(&self) -> &'static str {
        "list_quality_issues"
    }
    fn description(&self) -> &'static str {
        "List quality issues for a project, optionally filtered by status or severity"
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {"type": "string"},
                "status": {"type": "string", "enum": ["open", "resolved", "ignored"]},
                "severity": {"type": "string", "enum": ["low", "medium", "high", "critical"]}
            },
            "required": ["project_id"]
        })
    }
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let project_id = require_str(&args, "project_id")?;
        let status = opt_str(&args, "status").and_then(IssueStatus::parse);
        let severity = opt_str(&args, "severity").and_then(Severity::parse);
        let issues = state.store.list_quality_issues(project_id, status, severity, None).await?;
        Ok(json!({"issues": issues}))
    }
}
