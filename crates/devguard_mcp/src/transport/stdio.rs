//! stdio transport: a line-read loop feeding the async `dispatch` function.
//! Trusted — no admission gate.

use anyhow::Context;
use devguard_protocol::{ErrorCode, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::dispatch::dispatch;
use crate::state::AppState;

pub async fn run(state: AppState) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    info!("devguard MCP server starting on stdio");

    while let Some(line) = lines.next_line().await.context("failed to read from stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        debug!(%line, "received");

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let response = JsonRpcResponse::error(None, JsonRpcError::new(ErrorCode::ParseError, format!("Invalid JSON: {e}")));
                write_response(&mut stdout, &response).await?;
                continue;
            }
        };

        if let Some(audit) = &state.audit {
            audit.log_request(&request);
        }

        let response = dispatch(request, &state).await;

        if response.is_notification_ack() {
            continue;
        }

        if let Some(audit) = &state.audit {
            audit.log_response(&response);
        }

        write_response(&mut stdout, &response).await?;
    }

    info!("devguard MCP server shutting down");
    Ok(())
}

async fn write_response(stdout: &mut tokio::io::Stdout, response: &JsonRpcResponse) -> anyhow::Result<()> {
    let json = serde_json::to_string(response)?;
    debug!(%json, "sending");
    stdout.write_all(json.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
