//! MCP client: connection lifecycle, requests and reconnection.
//!
//! The [`McpClient`] owns at most one live [`Connection`] at a time and a
//! [`PendingTable`] that outlives individual connections.
//!
//! # Example
//!
//! ```no_run
//! use matrixhub_mcp::McpClient;
//!
//! # async fn example() -> matrixhub_mcp::Result<()> {
//! let client = McpClient::builder()
//!     .url("ws://localhost:8000/mcp")
//!     .build()?;
//!
//! client.connect().await?;
//! let server = client.initialize().await?;
//! println!("{} {}", server.name, server.version);
//!
//! for tool in client.list_tools().await? {
//!     println!("{}: {}", tool.name, tool.description);
//! }
//!
//! client.disconnect();
//! # Ok(())
//! # }
//! ```
//!
//! # Reconnection
//!
//! When the socket closes without [`McpClient::disconnect`] being called, a
//! supervisor task retries with the configured [`ReconnectPolicy`]
//! (1s, 2s, 4s, 8s, 16s by default). Requests in flight at that moment are
//! not failed; they run into their own timeout.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{oneshot, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{
    CallTool, CallToolParams, Envelope, Initialize, InitializeParams, ListResources, ListTools,
    Message, Method, ReadResource, ReadResourceParams, Resource, ServerInfo, Tool,
};
use crate::transport::connection::HandlerSlot;
use crate::transport::{
    CloseReason, Connection, NotificationHandler, PendingGuard, PendingTable, ReconnectPolicy,
};

use super::builder::ClientBuilder;
use super::options::ClientOptions;
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the client.
pub(crate) struct ClientInner {
    /// Client configuration.
    options: ClientOptions,

    /// Outstanding requests, shared with every connection.
    pending: Arc<PendingTable>,

    /// Current connection, if any.
    connection: Mutex<Option<Connection>>,

    /// Published connection state.
    state: watch::Sender<ConnectionState>,

    /// Notification handler (shared with every connection).
    notification_handler: HandlerSlot,

    /// Reconnect attempts since the last successful connect.
    reconnect_attempts: AtomicU32,

    /// Bumped by every explicit connect/disconnect; stale reconnect loops stop.
    epoch: AtomicU64,

    /// Serializes explicit connect calls.
    connect_lock: tokio::sync::Mutex<()>,
}

impl ClientInner {
    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Connection state changed");
        }
    }

    /// Sets the state only if no explicit connect/disconnect happened since `epoch`.
    fn set_state_if_current(&self, epoch: u64, state: ConnectionState) {
        if self.current_epoch() == epoch {
            self.set_state(state);
        }
    }
}

// ============================================================================
// McpClient
// ============================================================================

/// WebSocket MCP client.
///
/// Explicitly constructed and passed to whoever needs it; clones share the
/// same connection and pending table.
///
/// # Thread Safety
///
/// `McpClient` is `Send + Sync` and cheap to clone.
#[derive(Clone)]
pub struct McpClient {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// McpClient - Display
// ============================================================================

impl fmt::Debug for McpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpClient")
            .field("url", &self.inner.options.url.as_str())
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// McpClient - Construction
// ============================================================================

impl McpClient {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a disconnected client from options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a timeout or the pending limit is zero.
    pub fn new(options: ClientOptions) -> Result<Self> {
        options.validate()?;

        let pending = Arc::new(PendingTable::new(options.max_pending));
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            inner: Arc::new(ClientInner {
                options,
                pending,
                connection: Mutex::new(None),
                state,
                notification_handler: Arc::new(Mutex::new(None)),
                reconnect_attempts: AtomicU32::new(0),
                epoch: AtomicU64::new(0),
                connect_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Creates a disconnected client configured from the environment.
    ///
    /// See [`ClientOptions::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `MCP_URL` is invalid.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientOptions::from_env()?)
    }
}

// ============================================================================
// McpClient - Lifecycle
// ============================================================================

impl McpClient {
    /// Opens the WebSocket connection.
    ///
    /// Resolves once the handshake completes. A no-op when already
    /// connected. Resets the reconnect attempt counter and stops any
    /// reconnect loop in progress.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds the connect timeout
    /// - [`Error::Connection`] if the socket or handshake fails
    pub async fn connect(&self) -> Result<()> {
        let _guard = self.inner.connect_lock.lock().await;

        if self.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.reconnect_attempts.store(0, Ordering::SeqCst);

        self.establish(epoch).await
    }

    /// Closes the connection and cancels every pending request.
    ///
    /// Outstanding requests fail with [`Error::Cancelled`]. Any reconnect
    /// loop in progress stops.
    pub fn disconnect(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(connection) = self.inner.connection.lock().take() {
            connection.shutdown();
        }

        let cancelled = self.inner.pending.cancel_all();
        self.inner.set_state(ConnectionState::Disconnected);

        info!(cancelled, "Disconnected from MCP server");
    }

    /// Opens a connection on behalf of `epoch` and installs it.
    async fn establish(&self, epoch: u64) -> Result<()> {
        let inner = &self.inner;
        inner.set_state_if_current(epoch, ConnectionState::Connecting);

        let opened = Connection::open(
            &inner.options.url,
            inner.options.connect_timeout,
            Arc::clone(&inner.pending),
            Arc::clone(&inner.notification_handler),
        )
        .await;

        let (connection, closed_rx) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                inner.set_state_if_current(epoch, ConnectionState::Disconnected);
                return Err(e);
            }
        };

        {
            let mut slot = inner.connection.lock();
            if inner.current_epoch() != epoch {
                connection.shutdown();
                return Err(Error::connection(
                    "Connection superseded by a newer connect or disconnect",
                ));
            }
            *slot = Some(connection);

            // Published under the slot lock so a concurrent disconnect
            // cannot be overwritten with Connected.
            inner.reconnect_attempts.store(0, Ordering::SeqCst);
            inner.set_state(ConnectionState::Connected);
        }

        info!(url = %inner.options.url, "Connected to MCP server");

        Self::spawn_supervisor(Arc::downgrade(inner), epoch, closed_rx);
        Ok(())
    }

    /// Watches a connection and starts reconnecting if it closes unexpectedly.
    fn spawn_supervisor(
        inner: Weak<ClientInner>,
        epoch: u64,
        closed_rx: oneshot::Receiver<CloseReason>,
    ) {
        tokio::spawn(async move {
            let reason = closed_rx.await.unwrap_or(CloseReason::Local);
            Self::handle_close(inner, epoch, reason).await;
        });
    }

    /// Reacts to a closed connection.
    async fn handle_close(weak: Weak<ClientInner>, epoch: u64, reason: CloseReason) {
        {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if !reason.is_unexpected() || inner.current_epoch() != epoch {
                debug!(%reason, "Connection closed");
                return;
            }

            inner.connection.lock().take();
            inner.set_state(ConnectionState::Disconnected);
            warn!(
                %reason,
                abandoned = inner.pending.len(),
                "Connection closed unexpectedly"
            );
        }

        Self::reconnect_loop(weak, epoch).await;
    }

    /// Retries the connection following the reconnect policy.
    async fn reconnect_loop(weak: Weak<ClientInner>, epoch: u64) {
        loop {
            let (attempt, delay) = {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                if inner.current_epoch() != epoch {
                    return;
                }

                let attempt = inner.reconnect_attempts.load(Ordering::SeqCst) + 1;
                match inner.options.reconnect.delay_for(attempt) {
                    Some(delay) => {
                        inner.reconnect_attempts.store(attempt, Ordering::SeqCst);
                        (attempt, delay)
                    }
                    None => {
                        error!(
                            attempts = attempt - 1,
                            "Max reconnection attempts reached"
                        );
                        return;
                    }
                }
            };

            info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting"
            );
            sleep(delay).await;

            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.current_epoch() != epoch {
                return;
            }

            let client = Self { inner };
            match client.establish(epoch).await {
                Ok(()) => return,
                Err(e) => warn!(attempt, error = %e, "Reconnect attempt failed"),
            }
        }
    }
}

// ============================================================================
// McpClient - Requests
// ============================================================================

impl McpClient {
    /// Sends a request and waits for its result.
    ///
    /// # Arguments
    ///
    /// * `method` - Remote method name (e.g. `tools/list`)
    /// * `params` - Method params, omitted from the envelope when `None`
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the client is not connected
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::Remote`] if the server answers with an error
    /// - [`Error::Cancelled`] if [`disconnect`](Self::disconnect) is called meanwhile
    pub async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let connection = self.current_connection()?;

        let request_id = RequestId::generate();
        let request: Envelope = Message::request(request_id.clone(), method, params);

        let response_rx = connection
            .send_request(request)
            .map_err(|e| match e {
                Error::ConnectionClosed => Error::NotConnected,
                other => other,
            })?;
        // Removes the entry on timeout, or if this future is dropped early
        let _entry = PendingGuard::new(Arc::clone(&self.inner.pending), request_id.clone());
        debug!(request_id = %request_id, method, "Request sent");

        let request_timeout = self.inner.options.request_timeout;
        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result?.into_result(),
            Ok(Err(_)) => Err(Error::cancelled(request_id)),
            Err(_) => {
                warn!(request_id = %request_id, method, "Request timed out");

                Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Invokes a typed method and decodes its result.
    ///
    /// # Errors
    ///
    /// Same as [`send_request`](Self::send_request), plus
    /// [`Error::InvalidResponse`] if the result does not match `M::Output`.
    pub async fn call<M: Method>(&self, params: M::Params) -> Result<M::Output> {
        let params = M::encode_params(&params)?;
        let result = self.send_request(M::NAME, params).await?;
        M::decode_result(result)
    }

    /// Sends a one-way notification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the client is not connected.
    pub fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let connection = self.current_connection()?;
        connection
            .send(Message::notification(method, params))
            .map_err(|_| Error::NotConnected)
    }

    /// Returns the live connection, or [`Error::NotConnected`].
    ///
    /// A connection whose event loop already stopped counts as absent, even
    /// before the supervisor has published `Disconnected`.
    fn current_connection(&self) -> Result<Connection> {
        if !self.state().is_connected() {
            return Err(Error::NotConnected);
        }

        match self.inner.connection.lock().as_ref() {
            Some(connection) if !connection.is_closed() => Ok(connection.clone()),
            _ => Err(Error::NotConnected),
        }
    }
}

// ============================================================================
// McpClient - Protocol Methods
// ============================================================================

impl McpClient {
    /// Performs the `initialize` handshake.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn initialize(&self) -> Result<ServerInfo> {
        let params = InitializeParams::new(self.inner.options.client_info.clone());
        self.call::<Initialize>(params).await
    }

    /// Lists the server's tools.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        Ok(self.call::<ListTools>(()).await?.tools)
    }

    /// Invokes a tool.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn call_tool(&self, name: impl Into<String>, arguments: Value) -> Result<Value> {
        let params = CallToolParams {
            name: name.into(),
            arguments,
        };
        self.call::<CallTool>(params).await
    }

    /// Lists the server's resources.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        Ok(self.call::<ListResources>(()).await?.resources)
    }

    /// Reads a resource by URI.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn read_resource(&self, uri: impl Into<String>) -> Result<Value> {
        let params = ReadResourceParams { uri: uri.into() };
        self.call::<ReadResource>(params).await
    }
}

// ============================================================================
// McpClient - Notifications
// ============================================================================

impl McpClient {
    /// Sets the notification handler.
    ///
    /// The handler survives reconnects.
    pub fn set_notification_handler(&self, handler: NotificationHandler) {
        *self.inner.notification_handler.lock() = Some(handler);
    }

    /// Clears the notification handler.
    pub fn clear_notification_handler(&self) {
        *self.inner.notification_handler.lock() = None;
    }
}

// ============================================================================
// McpClient - Accessors
// ============================================================================

impl McpClient {
    /// Returns the server URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.options.url
    }

    /// Returns the client options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Returns the reconnect policy.
    #[inline]
    #[must_use]
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        self.inner.options.reconnect
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Returns a receiver that observes state changes.
    #[inline]
    #[must_use]
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Returns `true` if requests can be sent.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// Returns `true` if a request with this id is still pending.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, request_id: &RequestId) -> bool {
        self.inner.pending.contains(request_id)
    }

    /// Returns reconnect attempts made since the last successful connect.
    #[inline]
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.reconnect_attempts.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Tests
// ============================================================================
