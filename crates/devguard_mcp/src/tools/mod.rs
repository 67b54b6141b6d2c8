//! MCP tool trait + registry: `name`/`description`/`input_schema`/`execute`/
//! `definition` on a trait object, held in a
//! `HashMap<String, Box<dyn McpTool>>` registry. `execute` is `async fn`
//! taking a single `&AppState` bundle since every handler here calls the
//! async storage layer.

mod code;
mod context;
mod firewall;
mod memory;
mod quality;
mod registry;

pub use registry::ToolRegistry;

use async_trait::async_trait;
use devguard_protocol::ToolDefinition;
use serde_json::Value;

use crate::state::AppState;

#[async_trait]
pub trait McpTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, args: Value, state: &AppState) -> anyhow::Result<Value>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Pulls a required string argument, the shape every handler below needs
/// from the raw `arguments` object.
fn require_str<'a>(args: &'a Value, field: &str) -> anyhow::Result<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing required argument `{field}`"))
}

fn opt_str<'a>(args: &'a Value, field: &str) -> Option<&'a str> {
    args.get(field).and_then(Value::as_str)
}

fn opt_i64(args: &Value, field: &str) -> Option<i64> {
    args.get(field).and_then(Value::as_i64)
}

fn opt_f64(args: &Value, field: &str) -> Option<f64> {
    args.get(field).and_then(Value::as_f64)
}

fn opt_bool(args: &Value, field: &str) -> Option<bool> {
    args.get(field).and_then(Value::as_bool)
}

fn opt_str_vec(args: &Value, field: &str) -> Vec<String> {
    args.get(field)
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
        .unwrap_or_default()
}

use code::*;
use context::*;
use firewall::*;
use memory::*;
use quality::*;
