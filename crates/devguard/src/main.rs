//! devguard MCP server launcher.
//!
//! Does a single job: load `ServerConfig`, build `AppState`, and run one of
//! the three transports (stdio, HTTP, HTTP+SSE). Logging goes through a
//! single `tracing_subscriber` console layer.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use devguard_admission::AdmissionGate;
use devguard_mcp::transport::{http, sse, stdio};
use devguard_mcp::{AppState, ServerConfig};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "devguard", version, about = "devguard MCP server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve over stdio (the default; what MCP clients like Claude Desktop launch).
    Stdio,
    /// Serve JSON-RPC over HTTP, admission-gated.
    Http {
        #[arg(long)]
        addr: Option<String>,
    },
    /// Serve over HTTP+SSE, admission-gated.
    Sse {
        #[arg(long)]
        addr: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "devguard=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start tokio runtime: {err}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:?}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    let command = cli.command.unwrap_or(Commands::Stdio);

    let state = AppState::new(config.clone()).await?;
    info!(
        name = %state.config.server_name,
        version = %state.config.server_version,
        tools = state.tools.list_tools().len(),
        "devguard MCP server initialized"
    );

    match command {
        Commands::Stdio => {
            tokio::select! {
                result = stdio::run(state) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("received ctrl-c, shutting down");
                    Ok(())
                }
            }
        }
        Commands::Http { addr } => {
            let addr = addr.unwrap_or(config.http_addr.clone());
            let admission = Arc::new(AdmissionGate::new(
                config.api_keys.clone(),
                config.allowed_ips.clone(),
                config.rate_limit,
                config.rate_limit_per_seconds,
                config.max_connections,
            ));
            let http_state = http::HttpState { app: state, admission };
            tokio::select! {
                result = http::run(http_state, &addr) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("received ctrl-c, shutting down");
                    Ok(())
                }
            }
        }
        Commands::Sse { addr } => {
            let addr = addr.unwrap_or(config.http_addr.clone());
            let admission = Arc::new(AdmissionGate::new(
                config.api_keys.clone(),
                config.allowed_ips.clone(),
                config.rate_limit,
                config.rate_limit_per_seconds,
                config.max_connections,
            ));
            let sse_state = sse::SseState::new(state, admission);
            tokio::select! {
                result = sse::run(sse_state, &addr) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("received ctrl-c, shutting down");
                    Ok(())
                }
            }
        }
    }
}
