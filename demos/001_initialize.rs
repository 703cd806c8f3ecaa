//! Connect and perform the initialize handshake.
//!
//! Demonstrates:
//! - Building a client from `--url` or `MCP_URL`
//! - Connecting and reading server info
//! - Disconnecting cleanly
//!
//! Usage:
//!   cargo run --example 001_initialize
//!   cargo run --example 001_initialize -- --url ws://localhost:8000/mcp
//!   cargo run --example 001_initialize -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use matrixhub_mcp::Result;

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
    println!("=== 001: Initialize ===\n");

    let client = common::build_client(&args)?;

    client.connect().await?;
    println!("        ✓ Connected ({})\n", client.state());

    let info = client.initialize().await?;
    println!("[Server] {} {}", info.name, info.version);
    println!("        Capabilities: {}", info.capabilities.join(", "));
    println!("        Protocols:    {}", info.protocols.join(", "));

    client.disconnect();
    println!("\n        ✓ Disconnected");

    Ok(())
}
