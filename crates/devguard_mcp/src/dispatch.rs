//! The dispatcher: a pure function of `(request, state) -> response`.
//!
//! `AppState` is shared across every connection on every transport, so
//! there is no single connection-scoped place to remember "has this client
//! called `initialize` yet" — the handshake is stateless and `tools/call`
//! is accepted without requiring `initialize` first.

use devguard_protocol::{
    methods, ContentBlock, ErrorCode, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, ToolCallParams,
    ToolCallResult, ToolsCapability, ToolsListResult, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use tracing::{info, warn};

use crate::error::McpError;
use crate::state::AppState;

pub async fn dispatch(request: JsonRpcRequest, state: &AppState) -> JsonRpcResponse {
    if request.jsonrpc != JSONRPC_VERSION {
        return JsonRpcResponse::error(
            request.id,
            JsonRpcError::new(ErrorCode::InvalidRequest, format!("Invalid JSON-RPC version: {}", request.jsonrpc)),
        );
    }

    match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(request, state),
        methods::INITIALIZED => JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: request.id,
            result: None,
            error: None,
        },
        methods::TOOLS_LIST => handle_tools_list(request, state),
        methods::TOOLS_CALL => handle_tools_call(request, state).await,
        methods::PING => JsonRpcResponse::success(request.id, serde_json::json!({})),
        other => JsonRpcResponse::error(request.id, JsonRpcError::from(&McpError::MethodNotFound(other.to_string()))),
    }
}

fn handle_initialize(request: JsonRpcRequest, state: &AppState) -> JsonRpcResponse {
    let params: InitializeParams = match request.params.map(serde_json::from_value) {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            return JsonRpcResponse::error(request.id, JsonRpcError::new(ErrorCode::InvalidParams, format!("Invalid initialize params: {e}")));
        }
        None => {
            return JsonRpcResponse::error(request.id, JsonRpcError::new(ErrorCode::InvalidParams, "Missing initialize params"));
        }
    };

    info!(
        client = %params.client_info.name,
        version = %params.client_info.version,
        protocol = %params.protocol_version,
        "initialize"
    );

    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: false }),
            resources: None,
            prompts: None,
            logging: None,
        },
        server_info: ServerInfo {
            name: state.config.server_name.clone(),
            version: state.config.server_version.clone(),
        },
    };

    JsonRpcResponse::success(request.id, serde_json::to_value(result).expect("InitializeResult serializes"))
}

fn handle_tools_list(request: JsonRpcRequest, state: &AppState) -> JsonRpcResponse {
    let result = ToolsListResult { tools: state.tools.list_tools() };
    JsonRpcResponse::success(request.id, serde_json::to_value(result).expect("ToolsListResult serializes"))
}

async fn handle_tools_call(request: JsonRpcRequest, state: &AppState) -> JsonRpcResponse {
    let params: ToolCallParams = match request.params.map(serde_json::from_value) {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            return JsonRpcResponse::error(request.id, JsonRpcError::new(ErrorCode::InvalidParams, format!("Invalid tool call params: {e}")));
        }
        None => {
            return JsonRpcResponse::error(request.id, JsonRpcError::new(ErrorCode::InvalidParams, "Missing tool call params"));
        }
    };

    if !state.tools.has_tool(&params.name) {
        return JsonRpcResponse::error(request.id, JsonRpcError::from(&McpError::MethodNotFound(params.name)));
    }

    info!(tool = %params.name, "tools/call");

    match state.tools.call_tool(&params.name, params.arguments, state).await {
        Ok(value) => success_envelope(request.id, value, state),
        Err(err) => error_envelope(request.id, &err.to_string()),
    }
}

/// On success, serialize the tool's result into the text content block,
/// truncating (and flagging `isError`) if it would exceed the configured
/// response-size ceiling.
fn success_envelope(id: Option<devguard_protocol::RequestId>, value: serde_json::Value, state: &AppState) -> JsonRpcResponse {
    let json = match serde_json::to_string(&value) {
        Ok(j) => j,
        Err(e) => return error_envelope(id, &format!("serialization failed: {e}")),
    };

    let (content, was_truncated) = if json.len() > state.config.max_response_bytes {
        warn!(original_bytes = json.len(), max_bytes = state.config.max_response_bytes, "response truncated");
        let truncated = serde_json::json!({
            "truncated": true,
            "max_bytes": state.config.max_response_bytes,
            "original_bytes": json.len(),
            "message": "Response exceeded size limit. Use pagination or filters to reduce output.",
        });
        (serde_json::to_string(&truncated).expect("truncation envelope serializes"), true)
    } else {
        (json, false)
    };

    let tool_result = ToolCallResult {
        content: vec![ContentBlock::text(content)],
        is_error: was_truncated,
    };
    JsonRpcResponse::success(id, serde_json::to_value(tool_result).expect("ToolCallResult serializes"))
}

fn error_envelope(id: Option<devguard_protocol::RequestId>, message: &str) -> JsonRpcResponse {
    let tool_result = ToolCallResult {
        content: vec![ContentBlock::text(format!("Error: {message}"))],
        is_error: true,
    };
    JsonRpcResponse::success(id, serde_json::to_value(tool_result).expect("ToolCallResult serializes"))
}
