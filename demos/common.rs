//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Client construction

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use matrixhub_mcp::{ClientOptions, McpClient, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub url: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let url = args
            .iter()
            .position(|a| a == "--url")
            .and_then(|i| args.get(i + 1))
            .cloned();

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "matrixhub_mcp=debug"
    } else {
        "matrixhub_mcp=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Build a client from `--url`, or from `MCP_URL` / the default URL.
pub fn build_client(args: &Args) -> Result<McpClient> {
    let options = match &args.url {
        Some(url) => ClientOptions::new(url)?,
        None => ClientOptions::from_env()?,
    };
    println!("[Setup] Server: {}", options.url);
    McpClient::new(options)
}
