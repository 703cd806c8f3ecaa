//! Message envelope shared by requests, responses and notifications.
//!
//! # Format
//!
//! Request:
//! ```json
//! { "id": "uuid", "type": "request", "method": "tools/list", "params": { ... } }
//! ```
//!
//! Success response:
//! ```json
//! { "id": "uuid", "type": "response", "result": { ... } }
//! ```
//!
//! Error response:
//! ```json
//! { "id": "uuid", "type": "response", "error": { "code": 404, "message": "not found" } }
//! ```
//!
//! Notification:
//! ```json
//! { "id": "uuid", "type": "notification", "method": "tools/changed", "params": { ... } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// Constants
// ============================================================================

/// Error code sent back for server-initiated requests the client cannot serve.
pub const METHOD_NOT_FOUND: i64 = -32601;

// ============================================================================
// MessageKind
// ============================================================================

/// Envelope type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Method invocation expecting a response.
    Request,
    /// Reply to a request.
    Response,
    /// One-way message, no reply expected.
    Notification,
}

// ============================================================================
// RemoteError
// ============================================================================

/// Error payload carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

impl RemoteError {
    /// Creates a new remote error payload.
    #[inline]
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RemoteError> for Error {
    #[inline]
    fn from(err: RemoteError) -> Self {
        Error::remote(err.code, err.message)
    }
}

// ============================================================================
// Message
// ============================================================================

/// Protocol envelope, generic over its params and result payloads.
///
/// Both payloads default to free-form JSON, which is what the transport
/// reads off the wire. Typed payloads are decoded per method afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message<P = Value, R = Value> {
    /// Correlation id.
    pub id: RequestId,

    /// Envelope type.
    #[serde(rename = "type")]
    pub kind: MessageKind,

    /// Method name (requests and notifications).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,

    /// Result payload (successful responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,

    /// Error payload (failed responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

/// Envelope with untyped JSON payloads, as read from the wire.
pub type Envelope = Message<Value, Value>;

// ============================================================================
// Message - Constructors
// ============================================================================

impl<P, R> Message<P, R> {
    /// Creates a request envelope.
    #[inline]
    #[must_use]
    pub fn request(id: RequestId, method: impl Into<String>, params: Option<P>) -> Self {
        Self {
            id,
            kind: MessageKind::Request,
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Creates a notification envelope with a fresh id.
    #[inline]
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<P>) -> Self {
        Self {
            id: RequestId::generate(),
            kind: MessageKind::Notification,
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Creates a successful response envelope.
    #[inline]
    #[must_use]
    pub fn response(id: RequestId, result: R) -> Self {
        Self {
            id,
            kind: MessageKind::Response,
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response envelope.
    #[inline]
    #[must_use]
    pub fn error_response(id: RequestId, error: RemoteError) -> Self {
        Self {
            id,
            kind: MessageKind::Response,
            method: None,
            params: None,
            result: None,
            error: Some(error),
        }
    }
}

// ============================================================================
// Message - Accessors
// ============================================================================

impl<P, R> Message<P, R> {
    /// Returns the method name, or empty string if absent.
    #[inline]
    #[must_use]
    pub fn method_name(&self) -> &str {
        self.method.as_deref().unwrap_or_default()
    }

    /// Returns `true` if this is a response envelope.
    #[inline]
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.kind == MessageKind::Response
    }

    /// Checks the structural invariants of the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if:
    /// - a request or notification has no method
    /// - a request or notification carries a result or error
    /// - a response carries both a result and an error
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            MessageKind::Request | MessageKind::Notification => {
                if self.method_name().is_empty() {
                    return Err(Error::protocol(format!(
                        "{:?} {} has no method",
                        self.kind, self.id
                    )));
                }
                if self.result.is_some() || self.error.is_some() {
                    return Err(Error::protocol(format!(
                        "{:?} {} carries a result or error",
                        self.kind, self.id
                    )));
                }
            }
            MessageKind::Response => {
                if self.result.is_some() && self.error.is_some() {
                    return Err(Error::protocol(format!(
                        "Response {} carries both result and error",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Envelope {
    /// Extracts the result, or converts the error payload into [`Error::Remote`].
    ///
    /// A response with neither field resolves to `null`: JSON `"result": null`
    /// and an absent result are indistinguishable after decoding.
    ///
    /// # Errors
    ///
    /// - [`Error::Remote`] if the response carries an error
    /// - [`Error::Protocol`] if this is not a valid response
    pub fn into_result(self) -> Result<Value> {
        if !self.is_response() {
            return Err(Error::protocol(format!(
                "Expected response for {}, got {:?}",
                self.id, self.kind
            )));
        }
        self.validate()?;

        match self.error {
            Some(error) => Err(error.into()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
