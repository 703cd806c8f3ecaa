//! Tools and resources.
//!
//! Demonstrates:
//! - Listing tools and calling the first one
//! - Handling remote errors
//! - Listing and reading resources
//! - Receiving server notifications
//!
//! Usage:
//!   cargo run --example 002_tools
//!   cargo run --example 002_tools -- --url ws://localhost:8000/mcp --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use matrixhub_mcp::{Envelope, Error, Result};
use serde_json::json;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 002: Tools and Resources ===\n");

    let client = common::build_client(&args)?;
    client.set_notification_handler(Box::new(|notification: Envelope| {
        println!("[Notify] {}", notification.method_name());
    }));

    client.connect().await?;
    client.initialize().await?;

    // ========================================================================
    // Tools
    // ========================================================================

    let tools = client.list_tools().await?;
    println!("[Tools] {} available", tools.len());
    for tool in &tools {
        println!("        - {}: {}", tool.name, tool.description);
    }

    if let Some(tool) = tools.first() {
        match client.call_tool(&tool.name, json!({})).await {
            Ok(result) => println!("\n[Call] {} → {result}", tool.name),
            Err(Error::Remote { code, message }) => {
                println!("\n[Call] {} failed: {code} {message}", tool.name);
            }
            Err(e) => return Err(e),
        }
    }

    // ========================================================================
    // Resources
    // ========================================================================

    let resources = client.list_resources().await?;
    println!("\n[Resources] {} available", resources.len());
    for resource in &resources {
        println!("        - {} ({})", resource.name, resource.uri);
    }

    if let Some(resource) = resources.first() {
        let content = client.read_resource(&resource.uri).await?;
        println!("\n[Read] {} → {content}", resource.uri);
    }

    client.disconnect();
    Ok(())
}
