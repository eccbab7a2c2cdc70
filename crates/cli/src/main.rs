mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::info;

use toolbridge_mcp::ToolBridge;
use toolbridge_tool_runtime::ToolRegistry;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = config::load(&args).context("failed to load configuration")?;

    // Parse before spawning anything.
    let call_args: Option<Value> = match args.call {
        Some(_) => Some(
            serde_json::from_str(&args.args).context("--args must be a JSON value")?,
        ),
        None => None,
    };

    let mut registry = ToolRegistry::new();
    let bridge = ToolBridge::start(&config, &mut registry)
        .await
        .context("failed to start tool bridge")?;
    info!(registered = bridge.registered(), "Bridge ready");

    let result = run(&args, call_args, &registry).await;
    bridge.stop().await;
    result
}

async fn run(args: &CliArgs, call_args: Option<Value>, registry: &ToolRegistry) -> Result<()> {
    if args.list || args.call.is_none() {
        let definitions = registry.list();
        println!("{}", serde_json::to_string_pretty(&definitions)?);
    }

    if let (Some(name), Some(call_args)) = (args.call.as_deref(), call_args) {
        let outcome = registry
            .execute(name, call_args)
            .await
            .with_context(|| format!("tool '{name}' is not registered"))?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    Ok(())
}
