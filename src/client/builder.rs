//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`McpClient`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use matrixhub_mcp::McpClient;
//!
//! # fn example() -> matrixhub_mcp::Result<()> {
//! let client = McpClient::builder()
//!     .url("ws://localhost:8000/mcp")
//!     .request_timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};
use crate::protocol::ClientInfo;
use crate::transport::ReconnectPolicy;

use super::core::McpClient;
use super::options::{ClientOptions, parse_url};

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring an [`McpClient`] instance.
///
/// Use [`McpClient::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    /// Server WebSocket URL.
    url: Option<String>,
    /// Request timeout override.
    request_timeout: Option<Duration>,
    /// Handshake timeout override.
    connect_timeout: Option<Duration>,
    /// Reconnect policy override.
    reconnect: Option<ReconnectPolicy>,
    /// Client identity override.
    client_info: Option<ClientInfo>,
    /// Pending limit override.
    max_pending: Option<usize>,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new client builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server WebSocket URL.
    ///
    /// # Arguments
    ///
    /// * `url` - `ws://` or `wss://` URL (e.g., "ws://localhost:8000/mcp")
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets how long a request waits for its response.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets how long the WebSocket handshake may take.
    #[inline]
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    /// Disables automatic reconnection.
    #[inline]
    #[must_use]
    pub fn no_reconnect(mut self) -> Self {
        self.reconnect = Some(ReconnectPolicy::disabled());
        self
    }

    /// Sets the identity announced in `initialize`.
    #[inline]
    #[must_use]
    pub fn client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_info = Some(ClientInfo::new(name, version));
        self
    }

    /// Sets the pending request limit.
    #[inline]
    #[must_use]
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending);
        self
    }

    /// Builds the options without creating a client.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is missing or invalid
    /// - [`Error::Config`] if a timeout or limit is zero
    pub fn build_options(self) -> Result<ClientOptions> {
        let url = self.validate_url()?;

        let mut options = ClientOptions::with_url(url);
        if let Some(timeout) = self.request_timeout {
            options = options.with_request_timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            options = options.with_connect_timeout(timeout);
        }
        if let Some(policy) = self.reconnect {
            options = options.with_reconnect(policy);
        }
        if let Some(client_info) = self.client_info {
            options = options.with_client_info(client_info);
        }
        if let Some(max_pending) = self.max_pending {
            options = options.with_max_pending(max_pending);
        }

        options.validate()?;
        Ok(options)
    }

    /// Builds the client with validation.
    ///
    /// The client starts disconnected; call [`McpClient::connect`].
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the URL is missing or invalid
    /// - [`Error::Config`] if a timeout or limit is zero
    pub fn build(self) -> Result<McpClient> {
        McpClient::new(self.build_options()?)
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates the URL configuration.
    fn validate_url(&self) -> Result<url::Url> {
        let url = self.url.as_deref().ok_or_else(|| {
            Error::config(
                "Server URL is required. Use .url() to set it.\n\
                 Example: McpClient::builder().url(\"ws://localhost:8000/mcp\")",
            )
        })?;

        parse_url(url)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = ClientBuilder::new();
        assert!(builder.url.is_none());
        assert!(builder.reconnect.is_none());
    }

    #[test]
    fn test_build_fails_without_url() {
        let err = ClientBuilder::new().build_options().unwrap_err();
        assert!(err.to_string().contains("URL is required"));
    }

    #[test]
    fn test_build_fails_with_http_url() {
        let result = ClientBuilder::new().url("https://example.com").build_options();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_overrides_applied() {
        let options = ClientBuilder::new()
            .url("ws://127.0.0.1:9000/mcp")
            .request_timeout(Duration::from_millis(250))
            .connect_timeout(Duration::from_millis(100))
            .no_reconnect()
            .client_info("tester", "9.9.9")
            .max_pending(4)
            .build_options()
            .expect("valid options");

        assert_eq!(options.request_timeout, Duration::from_millis(250));
        assert_eq!(options.connect_timeout, Duration::from_millis(100));
        assert_eq!(options.reconnect.max_attempts, 0);
        assert_eq!(options.client_info, ClientInfo::new("tester", "9.9.9"));
        assert_eq!(options.max_pending, 4);
    }

    #[test]
    fn test_zero_pending_limit_rejected() {
        let result = ClientBuilder::new()
            .url("ws://127.0.0.1:9000/mcp")
            .max_pending(0)
            .build_options();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = ClientBuilder::new().url("ws://a/mcp");
        let cloned = builder.clone();
        assert_eq!(builder.url, cloned.url);
    }
}
