//! Protocol message types.
//!
//! This module defines the envelope exchanged with the MCP server and
//! the typed methods the client invokes.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `request` | Client → Server | Method invocation |
//! | `response` | Server → Client | Result or error for a request |
//! | `notification` | Server → Client | One-way update |
//!
//! One JSON envelope travels per WebSocket text frame.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | [`Message`] envelope and [`RemoteError`] |
//! | `method` | [`Method`] trait and method types |
//! | `types` | Params and result payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Message envelope.
pub mod envelope;

/// Typed protocol methods.
pub mod method;

/// Method payload types.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{Envelope, METHOD_NOT_FOUND, Message, MessageKind, RemoteError};
pub use method::{CallTool, Initialize, ListResources, ListTools, Method, ReadResource};
pub use types::{
    CallToolParams, ClientInfo, InitializeParams, ListResourcesResult, ListToolsResult,
    PROTOCOL_VERSION, ReadResourceParams, Resource, ServerInfo, Tool,
};
