//! List every capability aggregated across the configured servers.
//!
//! Usage: cargo run --example aggregate -- mcp_servers.json

use anyhow::Context;
use multimcp_client::{openai::tools_to_openai_format, McpServersConfig, MultiServerClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "mcp_servers.json".to_string());
    let config =
        McpServersConfig::load(&config_path).with_context(|| format!("loading {config_path}"))?;

    let client = MultiServerClient::connect(config).await?;
    client.log_capability_summary();

    println!("connected servers: {:?}", client.connected_servers());
    for (server, reason) in client.failed_servers() {
        println!("failed to connect {server}: {reason}");
    }

    println!("\ntools:");
    for tool in client.list_tools() {
        let marker = if tool.collision { "  [collides]" } else { "" };
        println!("  {} @ {}{}", tool.identifier(), tool.server, marker);
    }

    println!("\nresources (namespaced for auto-routing):");
    for resource in client.list_resources() {
        println!("  {}", resource.namespaced_uri());
    }

    println!("\nresource templates:");
    for template in client.list_resource_templates() {
        println!("  {}", template.namespaced_uri());
    }

    println!("\nprompts:");
    for prompt in client.list_prompts() {
        println!("  {} @ {}", prompt.identifier(), prompt.server);
    }

    let tools = client.list_tools();
    let openai = tools_to_openai_format(tools.iter().map(|t| &t.item));
    println!(
        "\nOpenAI tool schema:\n{}",
        serde_json::to_string_pretty(&openai)?
    );

    client.close().await?;
    Ok(())
}
