//! Client configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use matrixhub_mcp::ClientOptions;
//!
//! let options = ClientOptions::new("ws://localhost:8000/mcp")?
//!     .with_request_timeout(Duration::from_secs(10))
//!     .with_max_reconnect_attempts(3);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::protocol::ClientInfo;
use crate::transport::{MAX_PENDING_REQUESTS, ReconnectPolicy};

// ============================================================================
// Constants
// ============================================================================

/// Environment variable holding the server URL.
pub const MCP_URL_ENV: &str = "MCP_URL";

/// Server URL used when none is configured.
pub const DEFAULT_MCP_URL: &str = "ws://localhost:8000/mcp";

/// Default timeout for a request (30s).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for the WebSocket handshake (30s).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// ClientOptions
// ============================================================================

/// Configuration for an [`McpClient`](super::McpClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Server WebSocket URL.
    pub url: Url,

    /// How long a request waits for its response.
    pub request_timeout: Duration,

    /// How long the WebSocket handshake may take.
    pub connect_timeout: Duration,

    /// Reconnect schedule after an unexpected close.
    pub reconnect: ReconnectPolicy,

    /// Identity announced in `initialize`.
    pub client_info: ClientInfo,

    /// Maximum concurrently pending requests.
    pub max_pending: usize,
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options for the given server URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the URL is invalid or not `ws`/`wss`.
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self::with_url(parse_url(url)?))
    }

    /// Creates options for an already-parsed URL.
    #[must_use]
    pub fn with_url(url: Url) -> Self {
        Self {
            url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
            client_info: ClientInfo::default(),
            max_pending: MAX_PENDING_REQUESTS,
        }
    }

    /// Creates options from the environment.
    ///
    /// Reads the URL from `MCP_URL`, falling back to
    /// `ws://localhost:8000/mcp`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `MCP_URL` holds an invalid URL.
    pub fn from_env() -> Result<Self> {
        let url = env::var(MCP_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MCP_URL.to_string());

        Self::new(url.trim())
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the request timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the reconnect policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets the maximum number of reconnect attempts.
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect.max_attempts = attempts;
        self
    }

    /// Sets the delay before the first reconnect attempt.
    #[inline]
    #[must_use]
    pub fn with_reconnect_base_delay(mut self, delay: Duration) -> Self {
        self.reconnect.base_delay = delay;
        self
    }

    /// Sets the identity announced in `initialize`.
    #[inline]
    #[must_use]
    pub fn with_client_info(mut self, client_info: ClientInfo) -> Self {
        self.client_info = client_info;
        self
    }

    /// Sets the pending request limit.
    #[inline]
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientOptions {
    /// Validates timeouts and limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a timeout is zero or the pending limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("Connect timeout must be greater than zero"));
        }
        if self.max_pending == 0 {
            return Err(Error::config("Pending request limit must be greater than zero"));
        }
        Ok(())
    }
}

/// Parses and checks a server URL.
///
/// # Errors
///
/// Returns [`Error::Config`] if the URL does not parse or its scheme is
/// not `ws` or `wss`.
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| Error::config(format!("Invalid server URL '{url}': {e}")))?;

    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        scheme => Err(Error::config(format!(
            "Unsupported URL scheme '{scheme}' in '{url}'. Use ws:// or wss://"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new(DEFAULT_MCP_URL).expect("valid url");

        assert_eq!(options.url.as_str(), DEFAULT_MCP_URL);
        assert_eq!(options.request_timeout, Duration::from_secs(30));
        assert_eq!(options.connect_timeout, Duration::from_secs(30));
        assert_eq!(options.reconnect, ReconnectPolicy::default());
        assert_eq!(options.max_pending, MAX_PENDING_REQUESTS);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let options = ClientOptions::new("wss://hub.example.com/mcp")
            .expect("valid url")
            .with_request_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(2))
            .with_max_reconnect_attempts(3)
            .with_reconnect_base_delay(Duration::from_millis(100))
            .with_client_info(ClientInfo::new("tester", "0.0.1"))
            .with_max_pending(10);

        assert_eq!(options.request_timeout, Duration::from_secs(5));
        assert_eq!(options.connect_timeout, Duration::from_secs(2));
        assert_eq!(options.reconnect.max_attempts, 3);
        assert_eq!(options.reconnect.base_delay, Duration::from_millis(100));
        assert_eq!(options.client_info.name, "tester");
        assert_eq!(options.max_pending, 10);
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = ClientOptions::new("http://localhost:8000/mcp").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("ws://"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_url("not a url").is_err());
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let options = ClientOptions::new(DEFAULT_MCP_URL)
            .expect("valid url")
            .with_request_timeout(Duration::ZERO);
        assert!(options.validate().is_err());
    }
}
