//! Call one tool through the multiplexer, with optional explicit routing.
//!
//! Usage: cargo run --example call_tool -- mcp_servers.json tool_name ['{"arg":1}'] [server]

use anyhow::{bail, Context};
use multimcp_client::{McpServersConfig, MultiServerClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(tool_name)) = (args.next(), args.next()) else {
        bail!("usage: call_tool <config.json> <tool> [json-args] [server]");
    };
    let arguments = match args.next() {
        Some(raw) => serde_json::from_str(&raw).context("tool arguments must be a JSON object")?,
        None => None,
    };
    let server = args.next();

    let config =
        McpServersConfig::load(&config_path).with_context(|| format!("loading {config_path}"))?;

    let client = MultiServerClient::connect(config).await?;
    let result = client
        .call_tool(&tool_name, arguments, server.as_deref())
        .await;
    client.close().await?;

    println!("{:#?}", result?);
    Ok(())
}
