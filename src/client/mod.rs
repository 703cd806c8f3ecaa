//! MCP client and its configuration.
//!
//! Use [`McpClient::builder()`] to create a configured client.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent [`ClientBuilder`] |
//! | `core` | [`McpClient`] lifecycle and requests |
//! | `options` | [`ClientOptions`] and defaults |
//! | `state` | [`ConnectionState`] |

// ============================================================================
// Submodules
// ============================================================================

/// Builder pattern for client configuration.
pub mod builder;

/// Client lifecycle, requests and reconnection.
pub mod core;

/// Client configuration.
pub mod options;

/// Connection state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use self::core::McpClient;
pub use options::{ClientOptions, DEFAULT_MCP_URL, MCP_URL_ENV};
pub use state::ConnectionState;
