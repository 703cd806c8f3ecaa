//! MatrixHub MCP - WebSocket client for the MatrixHub agent protocol.
//!
//! This library talks to a remote agent/tool server over a single
//! WebSocket, correlating responses to requests by id.
//!
//! # Architecture
//!
//! The client follows a request/response model with server push:
//!
//! - **Client (Rust)**: Sends requests, receives responses and notifications
//! - **Server**: Lists and invokes tools, lists and reads resources
//!
//! Key design principles:
//!
//! - One [`McpClient`] owns one WebSocket connection and its event loop
//! - Responses are matched to requests solely by id (out-of-order safe)
//! - Every request is bounded by a timeout (30s by default)
//! - Unexpected closes trigger exponential-backoff reconnection
//!
//! # Quick Start
//!
//! ```no_run
//! use matrixhub_mcp::{McpClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = McpClient::builder()
//!         .url("ws://localhost:8000/mcp")
//!         .build()?;
//!
//!     client.connect().await?;
//!
//!     let server = client.initialize().await?;
//!     println!("Connected to {} {}", server.name, server.version);
//!
//!     let result = client
//!         .call_tool("search", serde_json::json!({"query": "summarizer"}))
//!         .await?;
//!     println!("{result}");
//!
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`McpClient`], builder, options, state |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Request id newtype |
//! | [`protocol`] | Envelope and typed methods |
//! | [`transport`] | WebSocket connection, pending table, backoff |

// ============================================================================
// Modules
// ============================================================================

/// Client lifecycle and protocol methods.
///
/// Use [`McpClient::builder()`] to create a configured client instance.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Protocol message types.
///
/// Envelope structure and typed method definitions.
pub mod protocol;

/// WebSocket transport layer.
///
/// Connection event loop, request correlation and reconnect schedule.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, ClientOptions, ConnectionState, McpClient};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::RequestId;

// Protocol types
pub use protocol::{
    ClientInfo, Envelope, Message, MessageKind, Method, RemoteError, Resource, ServerInfo, Tool,
};

// Transport types
pub use transport::{CloseReason, NotificationHandler, ReconnectPolicy};
