//! Domain types shared by every store module.
//!
//! These mirror the tables in `migrations/0001_init.sql` one-to-one; JSON
//! columns (`metadata`, `tags`, `depends_on`, ...) are stored as TEXT and
//! serialized/deserialized at the store boundary so callers never see a
//! `serde_json::Value` where a `Vec<String>` belongs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub path: String,
    pub language: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Module,
    Class,
    Function,
    Method,
    Interface,
    TypeAlias,
    Enum,
    ReactComponent,
    ReactHook,
    Variable,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Interface => "interface",
            Self::TypeAlias => "type_alias",
            Self::Enum => "enum",
            Self::ReactComponent => "react_component",
            Self::ReactHook => "react_hook",
            Self::Variable => "variable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "module" => Some(Self::Module),
            "class" => Some(Self::Class),
            "function" => Some(Self::Function),
            "method" => Some(Self::Method),
            "interface" => Some(Self::Interface),
            "type_alias" => Some(Self::TypeAlias),
            "enum" => Some(Self::Enum),
            "react_component" => Some(Self::ReactComponent),
            "react_hook" => Some(Self::ReactHook),
            "variable" => Some(Self::Variable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntity {
    pub entity_id: String,
    pub project_id: String,
    pub kind: EntityKind,
    pub name: String,
    pub qualified_name: String,
    pub file_path: String,
    pub line_start: i64,
    pub line_end: Option<i64>,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub parent_id: Option<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Calls,
    Imports,
    Inherits,
    Contains,
    References,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calls => "calls",
            Self::Imports => "imports",
            Self::Inherits => "inherits",
            Self::Contains => "contains",
            Self::References => "references",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "calls" => Some(Self::Calls),
            "imports" => Some(Self::Imports),
            "inherits" => Some(Self::Inherits),
            "contains" => Some(Self::Contains),
            "references" => Some(Self::References),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRelation {
    pub relation_id: String,
    pub project_id: String,
    pub source_id: String,
    /// `None` when the target is an unresolved external import (e.g. a
    /// third-party module path) rather than a `CodeEntity` in this project.
    pub target_id: Option<String>,
    pub kind: RelationKind,
    pub file_path: Option<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub goals: String,
    pub achievements: Option<String>,
    pub next_steps: Option<String>,
    pub files_modified: Vec<String>,
    pub issues_encountered: Vec<String>,
    pub context_summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Active,
    Superseded,
    Reverted,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Superseded => "superseded",
            Self::Reverted => "reverted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "superseded" => Some(Self::Superseded),
            "reverted" => Some(Self::Reverted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision_id: String,
    pub project_id: String,
    pub session_id: Option<String>,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub reasoning: String,
    pub alternatives: Vec<String>,
    pub trade_offs: Value,
    pub impact_scope: Option<String>,
    pub status: DecisionStatus,
    pub superseded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub note_id: String,
    pub project_id: String,
    pub session_id: Option<String>,
    pub category: String,
    pub title: String,
    pub content: String,
    pub importance: i64,
    pub related_code: Option<String>,
    pub related_entities: Vec<String>,
    pub tags: Vec<String>,
    pub is_resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Blocked,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "blocked" => Some(Self::Blocked),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub todo_id: String,
    pub project_id: String,
    pub session_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: i64,
    pub estimated_difficulty: i64,
    pub estimated_hours: Option<f64>,
    pub status: TodoStatus,
    pub progress: i64,
    pub depends_on: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Resolved,
    Ignored,
}

impl IssueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Ignored => "ignored",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "resolved" => Some(Self::Resolved),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub issue_id: String,
    pub project_id: String,
    pub issue_type: String,
    pub severity: Severity,
    pub entity_id: Option<String>,
    pub file_path: Option<String>,
    pub line_number: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub suggestion: Option<String>,
    pub metadata: Value,
    pub status: IssueStatus,
    pub detected_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtSnapshot {
    pub snapshot_id: String,
    pub project_id: String,
    pub overall_score: f64,
    pub code_quality_score: f64,
    pub test_coverage_score: f64,
    pub docs_coverage_score: f64,
    pub dependency_health_score: f64,
    pub todo_debt_score: f64,
    pub critical_count: i64,
    pub high_count: i64,
    pub medium_count: i64,
    pub low_count: i64,
    pub estimated_days_to_fix: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockLevel {
    None,
    Warning,
    Block,
}

impl BlockLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Warning => "warning",
            Self::Block => "block",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "warning" => Some(Self::Warning),
            "block" => Some(Self::Block),
            _ => None,
        }
    }
}

/// Row identity is `id` (autoincrement); `error_id` is the content hash used
/// for idempotent upsert (`record_error`) and external references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: i64,
    pub error_id: String,
    pub error_type: String,
    pub error_scene: String,
    pub error_pattern: Value,
    pub error_message: String,
    pub solution: Option<String>,
    pub solution_confidence: f64,
    pub block_level: BlockLevel,
    pub auto_fix: bool,
    pub occurrence_count: i64,
    pub blocked_count: i64,
    pub last_occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptAction {
    Allowed,
    Warned,
    Blocked,
}

impl InterceptAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Warned => "warned",
            Self::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allowed" => Some(Self::Allowed),
            "warned" => Some(Self::Warned),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptLog {
    pub id: i64,
    pub error_record_id: i64,
    pub intercept_type: String,
    pub intercept_action: InterceptAction,
    pub operation_type: String,
    pub operation_params: Value,
    pub match_confidence: f64,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
