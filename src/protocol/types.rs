//! Payload types exchanged by the protocol methods.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Protocol version announced in the `initialize` handshake.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Client name announced when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = "AgentLink";

// ============================================================================
// ClientInfo
// ============================================================================

/// Identity the client announces to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

impl ClientInfo {
    /// Creates a new client identity.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_NAME, env!("CARGO_PKG_VERSION"))
    }
}

// ============================================================================
// Initialize
// ============================================================================

/// Params of the `initialize` handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version spoken by the client.
    pub protocol_version: String,
    /// Client identity.
    pub client_info: ClientInfo,
}

impl InitializeParams {
    /// Creates handshake params for the current protocol version.
    #[inline]
    #[must_use]
    pub fn new(client_info: ClientInfo) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            client_info,
        }
    }
}

/// Server description returned by `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Capabilities advertised by the server.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Protocols the server speaks.
    #[serde(default)]
    pub protocols: Vec<String>,
}

impl ServerInfo {
    /// Returns `true` if the server advertises the given capability.
    #[inline]
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

// ============================================================================
// Tools
// ============================================================================

/// A tool exposed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Tool name, used with `tools/call`.
    pub name: String,
    /// What the tool does.
    #[serde(default)]
    pub description: String,
    /// JSON schema of the tool arguments.
    #[serde(default)]
    pub input_schema: Value,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// Listed tools. Missing on the wire means none.
    #[serde(default)]
    pub tools: Vec<Tool>,
}

/// Params of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Tool to invoke.
    pub name: String,
    /// Tool arguments.
    pub arguments: Value,
}

// ============================================================================
// Resources
// ============================================================================

/// A resource exposed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource URI, used with `resources/read`.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// MIME type of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Resource description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of `resources/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResourcesResult {
    /// Listed resources. Missing on the wire means none.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// Params of `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResourceParams {
    /// URI to read.
    pub uri: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_initialize_params_wire_format() {
        let params = InitializeParams::new(ClientInfo::new("AgentLink", "1.0.0"));
        let json = serde_json::to_value(&params).expect("serialize");

        assert_eq!(
            json,
            json!({
                "protocolVersion": "1.0",
                "clientInfo": {"name": "AgentLink", "version": "1.0.0"}
            })
        );
    }

    #[test]
    fn test_server_info_defaults_lists() {
        let info: ServerInfo =
            serde_json::from_value(json!({"name": "MatrixHub", "version": "2.1"})).expect("parse");

        assert!(info.capabilities.is_empty());
        assert!(info.protocols.is_empty());
        assert!(!info.has_capability("tools"));
    }

    #[test]
    fn test_tool_input_schema_rename() {
        let tool: Tool = serde_json::from_value(json!({
            "name": "search",
            "description": "Search entities",
            "inputSchema": {"type": "object"}
        }))
        .expect("parse");

        assert_eq!(tool.input_schema, json!({"type": "object"}));
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let tools: ListToolsResult = serde_json::from_value(json!({})).expect("parse");
        let resources: ListResourcesResult = serde_json::from_value(json!({})).expect("parse");

        assert!(tools.tools.is_empty());
        assert!(resources.resources.is_empty());
    }

    #[test]
    fn test_resource_optional_fields() {
        let resource: Resource = serde_json::from_value(json!({
            "uri": "hub://agents/1",
            "name": "Agent 1",
            "mimeType": "application/json"
        }))
        .expect("parse");

        assert_eq!(resource.mime_type.as_deref(), Some("application/json"));
        assert!(resource.description.is_none());

        let json = serde_json::to_value(&resource).expect("serialize");
        assert!(json.get("description").is_none());
    }
}
