use std::collections::HashMap;

use devguard_protocol::ToolDefinition;
use serde_json::Value;
use tracing::debug;

use super::*;
use crate::state::AppState;

pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn McpTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };

        registry.register(Box::new(StoreMemoryTool));
        registry.register(Box::new(RetrieveMemoryTool));

        registry.register(Box::new(AnalyzeCodebaseTool));
        registry.register(Box::new(QueryArchitectureTool));
        registry.register(Box::new(FindEntityTool));
        registry.register(Box::new(TraceFunctionCallsTool));
        registry.register(Box::new(FindDependenciesTool));
        registry.register(Box::new(ListModulesTool));
        registry.register(Box::new(ExplainModuleTool));
        registry.register(Box::new(SearchCodePatternTool));

        registry.register(Box::new(StartDevSessionTool));
        registry.register(Box::new(EndDevSessionTool));
        registry.register(Box::new(RecordDesignDecisionTool));
        registry.register(Box::new(SupersedeDecisionTool));
        registry.register(Box::new(AddProjectNoteTool));
        registry.register(Box::new(CreateTodoTool));
        registry.register(Box::new(UpdateTodoStatusTool));
        registry.register(Box::new(GetProjectContextTool));
        registry.register(Box::new(ListTodosTool));
        registry.register(Box::new(GetNextTodoTool));
        registry.register(Box::new(ListDesignDecisionsTool));
        registry.register(Box::new(ListProjectNotesTool));
        registry.register(Box::new(GetProjectStatisticsTool));

        registry.register(Box::new(DetectCodeSmellsTool));
        registry.register(Box::new(AssessTechnicalDebtTool));
        registry.register(Box::new(IdentifyDebtHotspotsTool));
        registry.register(Box::new(GetQualityTrendsTool));
        registry.register(Box::new(ResolveQualityIssueTool));
        registry.register(Box::new(IgnoreQualityIssueTool));
        registry.register(Box::new(GenerateQualityReportTool));
        registry.register(Box::new(ListQualityIssuesTool));

        registry.register(Box::new(ErrorFirewallRecordTool));
        registry.register(Box::new(ErrorFirewallCheckTool));
        registry.register(Box::new(ErrorFirewallQueryTool));
        registry.register(Box::new(ErrorFirewallStatsTool));

        debug!("Registered {} tools", registry.tools.len());
        registry
    }

    fn register(&mut self, tool: Box<dyn McpTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub async fn call_tool(&self, name: &str, args: Value, state: &AppState) -> anyhow::Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {name}"))?;
        tool.execute(args, state).await
    }

    pub fn get_tool(&self, name: &str) -> Option<&dyn McpTool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_every_catalog_tool() {
        let registry = ToolRegistry::new();
        for name in [
            "store_memory",
            "retrieve_memory",
            "analyze_codebase",
            "query_architecture",
            "find_entity",
            "trace_function_calls",
            "find_dependencies",
            "list_modules",
            "explain_module",
            "search_code_pattern",
            "start_dev_session",
            "end_dev_session",
            "record_design_decision",
            "supersede_decision",
            "add_project_note",
            "create_todo",
            "update_todo_status",
            "get_project_context",
            "list_todos",
            "get_next_todo",
            "list_design_decisions",
            "list_project_notes",
            "get_project_statistics",
            "detect_code_smells",
            "assess_technical_debt",
            "identify_debt_hotspots",
            "get_quality_trends",
            "resolve_quality_issue",
            "ignore_quality_issue",
            "generate_quality_report",
            "list_quality_issues",
            "error_firewall_record",
            "error_firewall_check",
            "error_firewall_query",
            "error_firewall_stats",
        ] {
            assert!(registry.has_tool(name), "missing tool: {name}");
        }
    }
}
