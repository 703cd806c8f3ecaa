//! Shared utilities for integration tests.
//!
//! Provides an in-process MCP server speaking the envelope protocol over
//! WebSocket, plus logging and polling helpers.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Maps one inbound frame to the frames sent back.
pub type Handler = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

/// Commands fanned out to every live server-side socket.
#[derive(Debug, Clone)]
enum Control {
    /// Send a frame to the client.
    Push(Value),
    /// Drop the socket without a close frame.
    Drop,
}

// ============================================================================
// MockServer
// ============================================================================

/// In-process WebSocket server answering MCP requests.
pub struct MockServer {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<Value>>>,
    control: broadcast::Sender<Control>,
    accept_task: JoinHandle<()>,
}

impl MockServer {
    /// Starts a server answering with [`standard_reply`].
    pub async fn standard() -> Self {
        Self::start(standard_reply).await
    }

    /// Starts a server answering with a custom handler.
    pub async fn start(handler: impl Fn(&Value) -> Vec<Value> + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");

        let handler: Handler = Arc::new(handler);
        let connections = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let (control, _) = broadcast::channel(16);

        let accept_task = tokio::spawn({
            let connections = Arc::clone(&connections);
            let received = Arc::clone(&received);
            let control = control.clone();

            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                        continue;
                    };
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(
                        ws,
                        Arc::clone(&handler),
                        Arc::clone(&received),
                        control.subscribe(),
                    ));
                }
            }
        });

        Self {
            addr,
            connections,
            received,
            control,
            accept_task,
        }
    }

    /// Returns the `ws://` URL of the server.
    pub fn url(&self) -> String {
        format!("ws://{}/mcp", self.addr)
    }

    /// Returns how many WebSocket connections were accepted.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Returns every frame received so far.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().clone()
    }

    /// Sends a frame to every connected client.
    pub fn push(&self, frame: Value) {
        let _ = self.control.send(Control::Push(frame));
    }

    /// Drops every live socket without a close handshake.
    pub fn drop_connections(&self) {
        let _ = self.control.send(Control::Drop);
    }

    /// Stops accepting and drops every live socket.
    pub fn shutdown(self) {
        self.accept_task.abort();
        self.drop_connections();
    }
}

/// Serves one WebSocket connection.
async fn serve(
    ws: WebSocketStream<TcpStream>,
    handler: Handler,
    received: Arc<Mutex<Vec<Value>>>,
    mut control: broadcast::Receiver<Control>,
) {
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(value) = serde_json::from_str::<Value>(&text) else {
                            continue;
                        };
                        received.lock().push(value.clone());

                        for reply in handler(&value) {
                            if write.send(Message::Text(reply.to_string().into())).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    _ => {}
                }
            }

            command = control.recv() => {
                match command {
                    Ok(Control::Push(frame)) => {
                        let _ = write.send(Message::Text(frame.to_string().into())).await;
                    }
                    Ok(Control::Drop) | Err(_) => return,
                }
            }
        }
    }
}

// ============================================================================
// Replies
// ============================================================================

/// Builds a success response.
pub fn ok(id: &Value, result: Value) -> Value {
    json!({"id": id, "type": "response", "result": result})
}

/// Builds an error response.
pub fn err(id: &Value, code: i64, message: &str) -> Value {
    json!({"id": id, "type": "response", "error": {"code": code, "message": message}})
}

/// Default behaviour of the mock server.
///
/// | Method | Reply |
/// |--------|-------|
/// | `initialize` | MatrixHub server info |
/// | `tools/list` | empty list |
/// | `tools/call` | echoes arguments for `echo`, 404 otherwise |
/// | `resources/list` | one resource |
/// | `resources/read` | uri plus contents |
/// | `slow` | never answers |
pub fn standard_reply(frame: &Value) -> Vec<Value> {
    if frame["type"] != "request" {
        return Vec::new();
    }

    let id = &frame["id"];
    let method = frame["method"].as_str().unwrap_or_default();

    let reply = match method {
        "initialize" => ok(
            id,
            json!({
                "name": "MatrixHub",
                "version": "1.2.0",
                "capabilities": ["tools", "resources"],
                "protocols": ["mcp"]
            }),
        ),
        "tools/list" => ok(id, json!({"tools": []})),
        "tools/call" => match frame["params"]["name"].as_str() {
            Some("echo") => ok(id, json!({"echo": frame["params"]["arguments"]})),
            _ => err(id, 404, "not found"),
        },
        "resources/list" => ok(
            id,
            json!({
                "resources": [{
                    "uri": "hub://agents/1",
                    "name": "Agent One",
                    "mimeType": "application/json"
                }]
            }),
        ),
        "resources/read" => ok(
            id,
            json!({"uri": frame["params"]["uri"], "contents": "{\"uid\":\"agent-1\"}"}),
        ),
        "slow" => return Vec::new(),
        other => err(id, -32601, &format!("Method not found: {other}")),
    };

    vec![reply]
}

// ============================================================================
// Helpers
// ============================================================================

/// Initialize tracing for tests (idempotent).
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matrixhub_mcp=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Polls `condition` every 5ms until it holds or `limit` elapses.
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
