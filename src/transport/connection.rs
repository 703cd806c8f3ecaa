//! WebSocket connection and event loop.
//!
//! This module handles a single WebSocket connection to the MCP server,
//! including response correlation and notification routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming frames from the server (responses, notifications, requests)
//! - Outgoing envelopes from the client API
//! - Response delivery through the shared [`PendingTable`]
//! - Notification handler callbacks
//!
//! When the loop ends it reports a [`CloseReason`] so the owner can decide
//! whether to reconnect.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{Envelope, METHOD_NOT_FOUND, Message, MessageKind, RemoteError};

use super::pending::{PendingResult, PendingTable};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

type WsSink = SplitSink<WsStream, WsMessage>;

/// Notification handler callback type.
///
/// Called for each notification received from the server.
pub type NotificationHandler = Box<dyn Fn(Envelope) + Send + Sync>;

/// Shared slot holding the current notification handler.
pub(crate) type HandlerSlot = Arc<Mutex<Option<NotificationHandler>>>;

// ============================================================================
// CloseReason
// ============================================================================

/// Why a connection's event loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Closed by this side (shutdown or all handles dropped).
    Local,
    /// Server sent a close frame or the stream ended.
    Remote,
    /// Socket error.
    Error(String),
}

impl CloseReason {
    /// Returns `true` if the close was not requested by this side.
    #[inline]
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("closed locally"),
            Self::Remote => f.write_str("closed by remote"),
            Self::Error(e) => write!(f, "socket error: {e}"),
        }
    }
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write an envelope to the socket.
    Send(Envelope),
    /// Close the socket.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to the MCP server.
///
/// Cloning yields another handle to the same event loop. The loop stops
/// on [`Connection::shutdown`], when the socket closes, or when every
/// handle has been dropped.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation table (shared with the event loop and the client).
    pending: Arc<PendingTable>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl Connection {
    /// Opens a WebSocket to `url` and spawns the event loop.
    ///
    /// Returns the connection and a receiver that resolves with the
    /// [`CloseReason`] once the loop stops.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the handshake exceeds `connect_timeout`
    /// - [`Error::Connection`] if the socket or handshake fails
    pub async fn open(
        url: &Url,
        connect_timeout: Duration,
        pending: Arc<PendingTable>,
        handler: HandlerSlot,
    ) -> Result<(Self, oneshot::Receiver<CloseReason>)> {
        let (ws_stream, _) = timeout(connect_timeout, tokio_tungstenite::connect_async(url.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(connect_timeout.as_millis() as u64))?
            .map_err(|e| Error::connection(format!("WebSocket handshake failed: {e}")))?;

        debug!(%url, "WebSocket handshake completed");

        Ok(Self::from_stream(ws_stream, pending, handler))
    }

    /// Wraps an established stream and spawns the event loop.
    pub(crate) fn from_stream(
        ws_stream: WsStream,
        pending: Arc<PendingTable>,
        handler: HandlerSlot,
    ) -> (Self, oneshot::Receiver<CloseReason>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = oneshot::channel();

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&pending),
            handler,
            closed_tx,
        ));

        (
            Self {
                command_tx,
                pending,
            },
            closed_rx,
        )
    }

    /// Returns a connection whose event loop has already stopped.
    #[cfg(test)]
    pub(crate) fn closed(pending: Arc<PendingTable>) -> Self {
        let (command_tx, _) = mpsc::unbounded_channel();
        Self {
            command_tx,
            pending,
        }
    }

    /// Registers a request in the pending table and queues it for sending.
    ///
    /// The returned receiver completes with the response, or with an error
    /// if the frame cannot be written.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the id is already pending or the table is full
    /// - [`Error::ConnectionClosed`] if the event loop has stopped
    pub fn send_request(&self, request: Envelope) -> Result<oneshot::Receiver<PendingResult>> {
        let request_id = request.id.clone();
        let response_rx = self.pending.register(request_id.clone())?;

        if self
            .command_tx
            .send(ConnectionCommand::Send(request))
            .is_err()
        {
            self.pending.remove(&request_id);
            return Err(Error::ConnectionClosed);
        }

        Ok(response_rx)
    }

    /// Queues an envelope that expects no response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has stopped.
    pub fn send(&self, envelope: Envelope) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Send(envelope))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Closes the connection.
    ///
    /// Pending requests are left in the table.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        pending: Arc<PendingTable>,
        handler: HandlerSlot,
        closed_tx: oneshot::Sender<CloseReason>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let reason = loop {
            tokio::select! {
                // Incoming frames from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(WsMessage::Text(text))) => {
                            let reply = Self::handle_incoming_message(&text, &pending, &handler);

                            if let Some(reply) = reply
                                && let Err(e) = Self::write_envelope(&mut ws_write, &reply).await
                            {
                                warn!(error = %e, "Failed to send reply");
                            }
                        }

                        Some(Ok(WsMessage::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break CloseReason::Remote;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break CloseReason::Error(e.to_string());
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break CloseReason::Remote;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the client
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(envelope)) => {
                            Self::handle_send_command(envelope, &mut ws_write, &pending).await;
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break CloseReason::Local;
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            break CloseReason::Local;
                        }
                    }
                }
            }
        };

        debug!(%reason, pending = pending.len(), "Event loop terminated");
        let _ = closed_tx.send(reason);
    }

    /// Handles an incoming text frame.
    ///
    /// Returns an envelope to send back, if any.
    fn handle_incoming_message(
        text: &str,
        pending: &PendingTable,
        handler: &HandlerSlot,
    ) -> Option<Envelope> {
        let envelope = match from_str::<Envelope>(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, text = %text, "Failed to parse incoming message");
                return None;
            }
        };

        trace!(id = %envelope.id, kind = ?envelope.kind, "Message received");

        match envelope.kind {
            MessageKind::Response => {
                let id = envelope.id.clone();
                if !pending.complete(envelope) {
                    warn!(request_id = %id, "Response for unknown request");
                }
                None
            }

            MessageKind::Notification => {
                if let Err(e) = envelope.validate() {
                    warn!(error = %e, "Dropping invalid notification");
                    return None;
                }
                let handler = handler.lock();
                if let Some(ref handler) = *handler {
                    handler(envelope);
                }
                None
            }

            MessageKind::Request => {
                if let Err(e) = envelope.validate() {
                    warn!(error = %e, "Dropping invalid request");
                    return None;
                }
                let method = envelope.method_name();
                warn!(method, "Server-initiated request not supported");
                Some(Message::error_response(
                    envelope.id.clone(),
                    RemoteError::new(METHOD_NOT_FOUND, format!("Method not found: {method}")),
                ))
            }
        }
    }

    /// Handles a send command from the client.
    async fn handle_send_command(envelope: Envelope, ws_write: &mut WsSink, pending: &PendingTable) {
        let id = envelope.id.clone();

        if let Err(e) = Self::write_envelope(ws_write, &envelope).await {
            // Only requests have a waiter to notify
            if pending.fail(&id, e) {
                debug!(request_id = %id, "Request failed before transmission");
            }
            return;
        }

        trace!(request_id = %id, "Message sent");
    }

    /// Serializes an envelope and writes it as one text frame.
    async fn write_envelope(ws_write: &mut WsSink, envelope: &Envelope) -> Result<()> {
        let json = to_string(envelope)?;
        ws_write
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| Error::connection(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::identifiers::RequestId;

    fn no_handler() -> HandlerSlot {
        Arc::new(Mutex::new(None))
    }

    #[test]
    fn test_close_reason_classification() {
        assert!(!CloseReason::Local.is_unexpected());
        assert!(CloseReason::Remote.is_unexpected());
        assert!(CloseReason::Error("reset".into()).is_unexpected());
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::Remote.to_string(), "closed by remote");
        assert_eq!(
            CloseReason::Error("reset".into()).to_string(),
            "socket error: reset"
        );
    }

    #[tokio::test]
    async fn test_incoming_response_completes_pending() {
        let pending = PendingTable::default();
        let rx = pending.register(RequestId::new("r1")).expect("register");

        let text = r#"{"id":"r1","type":"response","result":{"tools":[]}}"#;
        let reply = Connection::handle_incoming_message(text, &pending, &no_handler());

        assert!(reply.is_none());
        assert!(pending.is_empty());
        let envelope = rx.await.expect("channel").expect("ok");
        assert_eq!(envelope.result, Some(json!({"tools": []})));
    }

    #[test]
    fn test_incoming_unknown_response_ignored() {
        let pending = PendingTable::default();
        let _rx = pending.register(RequestId::new("r1")).expect("register");

        let text = r#"{"id":"other","type":"response","result":1}"#;
        let reply = Connection::handle_incoming_message(text, &pending, &no_handler());

        assert!(reply.is_none());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_incoming_garbage_ignored() {
        let pending = PendingTable::default();
        let reply = Connection::handle_incoming_message("not json", &pending, &no_handler());
        assert!(reply.is_none());
    }

    #[test]
    fn test_incoming_notification_reaches_handler() {
        let pending = PendingTable::default();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: NotificationHandler = Box::new(move |n: Envelope| {
            seen_clone.lock().push(n.method_name().to_string());
        });
        let handler: HandlerSlot = Arc::new(Mutex::new(Some(callback)));

        let text = r#"{"id":"n1","type":"notification","method":"tools/changed"}"#;
        let reply = Connection::handle_incoming_message(text, &pending, &handler);

        assert!(reply.is_none());
        assert_eq!(*seen.lock(), vec!["tools/changed".to_string()]);
    }

    #[test]
    fn test_incoming_request_answered_with_method_not_found() {
        let pending = PendingTable::default();
        let text = r#"{"id":"s1","type":"request","method":"sampling/create"}"#;

        let reply = Connection::handle_incoming_message(text, &pending, &no_handler())
            .expect("reply");

        assert_eq!(reply.id.as_str(), "s1");
        assert_eq!(reply.kind, MessageKind::Response);
        let error = reply.error.expect("error payload");
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: sampling/create");
    }
}
