//! WebSocket transport layer.
//!
//! This module handles communication between the client and the MCP
//! server over a single WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  McpClient      │                              │  MCP server     │
//! │                 │         WebSocket            │                 │
//! │  Connection     │─────────────────────────────►│  /mcp           │
//! │  PendingTable   │◄─────────────────────────────│                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - WebSocket handshake, event loop spawned
//! 2. `Connection::send_request` - Register id, write envelope
//! 3. Event loop delivers responses through `PendingTable`
//! 4. Loop ends on close and reports a `CloseReason`
//! 5. Owner consults `ReconnectPolicy` for the next attempt
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `backoff` | Reconnect delay schedule |
//! | `connection` | WebSocket connection and event loop |
//! | `pending` | Request/response correlation table |

// ============================================================================
// Submodules
// ============================================================================

/// Reconnect backoff policy.
pub mod backoff;

/// WebSocket connection and event loop.
pub mod connection;

/// Pending-request table.
pub mod pending;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::ReconnectPolicy;
pub use connection::{CloseReason, Connection, NotificationHandler};
pub use pending::{MAX_PENDING_REQUESTS, PendingGuard, PendingTable};
