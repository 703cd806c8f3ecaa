//! Typed protocol methods.
//!
//! Each remote method is a zero-sized type implementing [`Method`],
//! which pins its wire name, params type and result type. Results are
//! validated against the declared type when they come back.
//!
//! | Type | Wire name |
//! |------|-----------|
//! | [`Initialize`] | `initialize` |
//! | [`ListTools`] | `tools/list` |
//! | [`CallTool`] | `tools/call` |
//! | [`ListResources`] | `resources/list` |
//! | [`ReadResource`] | `resources/read` |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

use super::types::{
    CallToolParams, InitializeParams, ListResourcesResult, ListToolsResult, ReadResourceParams,
    ServerInfo,
};

// ============================================================================
// Method
// ============================================================================

/// A remote method with declared params and result types.
pub trait Method {
    /// Wire name of the method.
    const NAME: &'static str;

    /// Params payload. `()` means the request carries no params.
    type Params: Serialize + Send;

    /// Decoded result payload.
    type Output: DeserializeOwned;

    /// Encodes params into the envelope's `params` field.
    ///
    /// `null` encodings are omitted from the envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the params fail to serialize.
    fn encode_params(params: &Self::Params) -> Result<Option<Value>> {
        match serde_json::to_value(params)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    /// Decodes a raw result into [`Self::Output`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] if the result does not match.
    fn decode_result(result: Value) -> Result<Self::Output> {
        serde_json::from_value(result).map_err(|e| Error::invalid_response(Self::NAME, e.to_string()))
    }
}

// ============================================================================
// Methods
// ============================================================================

/// `initialize` handshake.
#[derive(Debug, Clone, Copy)]
pub struct Initialize;

impl Method for Initialize {
    const NAME: &'static str = "initialize";
    type Params = InitializeParams;
    type Output = ServerInfo;
}

/// `tools/list`.
#[derive(Debug, Clone, Copy)]
pub struct ListTools;

impl Method for ListTools {
    const NAME: &'static str = "tools/list";
    type Params = ();
    type Output = ListToolsResult;
}

/// `tools/call`.
#[derive(Debug, Clone, Copy)]
pub struct CallTool;

impl Method for CallTool {
    const NAME: &'static str = "tools/call";
    type Params = CallToolParams;
    type Output = Value;
}

/// `resources/list`.
#[derive(Debug, Clone, Copy)]
pub struct ListResources;

impl Method for ListResources {
    const NAME: &'static str = "resources/list";
    type Params = ();
    type Output = ListResourcesResult;
}

/// `resources/read`.
#[derive(Debug, Clone, Copy)]
pub struct ReadResource;

impl Method for ReadResource {
    const NAME: &'static str = "resources/read";
    type Params = ReadResourceParams;
    type Output = Value;
}

// ============================================================================
// Tests
// ============================================================================
