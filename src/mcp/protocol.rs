/// MCP (Model Context Protocol) message structures for the client side
///
/// This module defines the JSON-RPC envelopes the probe sends to the
/// Businessmap MCP server and the responses it reads back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC version carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version announced in `initialize`
pub const MCP_PROTOCOL_VERSION: &str = "2025-06-18";

/// Method names used by the scripted exchange
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Tools exposed by the Businessmap MCP server
pub mod tools {
    /// Read title, description, subtasks and comments of a card
    pub const READ_CARD: &str = "read_card";
    /// Add a comment to a card
    pub const ADD_CARD_COMMENT: &str = "add_card_comment";
}

/// JSON-RPC 2.0 request message
///
/// A request without an `id` is a notification: the server must not answer it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Sequence number, omitted for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// The method to invoke (e.g., "tools/call")
    pub method: String,
    /// Method-dependent parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response message
///
/// Exactly one of `result` and `error` is expected, but the probe does not
/// enforce it; whatever the server sends is shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Echoed request ID (null when the server could not parse our request)
    #[serde(default)]
    pub id: Value,
    /// Successful result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Any other top-level members the server sent, kept for display
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// JSON-RPC error information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code (standard JSON-RPC codes)
    pub code: i64,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// MCP tool call parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call (e.g., "read_card")
    pub name: String,
    /// Arguments to pass to the tool
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// Capabilities the probe declares during initialization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Tool support; an empty object means "tools, no extras"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Map<String, Value>>,
}

/// Information about the MCP client (this probe)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// MCP initialization request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// MCP protocol version the client speaks
    pub protocol_version: String,
    /// Capabilities the client supports
    pub capabilities: ClientCapabilities,
    /// Client identification
    pub client_info: ClientInfo,
}

// JSON-RPC error codes (standard codes)
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i64 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i64 = -32600;
    /// Method not found - The requested method doesn't exist
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid parameters - Method exists but parameters are wrong
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal error - Internal JSON-RPC error
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Short name for a standard code, if it is one
    pub fn name(code: i64) -> Option<&'static str> {
        match code {
            PARSE_ERROR => Some("parse error"),
            INVALID_REQUEST => Some("invalid request"),
            METHOD_NOT_FOUND => Some("method not found"),
            INVALID_PARAMS => Some("invalid params"),
            INTERNAL_ERROR => Some("internal error"),
            -32099..=-32000 => Some("server error"),
            _ => None,
        }
    }
}

impl JsonRpcRequest {
    /// Create a request that expects a response
    pub fn call(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: method.to_string(),
            params,
        }
    }

    /// Create a fire-and-forget notification
    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.to_string(),
            params,
        }
    }

    /// `initialize` handshake request
    pub fn initialize(id: u64, params: &InitializeParams) -> Self {
        Self::call(id, methods::INITIALIZE, serde_json::to_value(params).ok())
    }

    /// `notifications/initialized`, sent once the handshake response is in
    pub fn initialized() -> Self {
        Self::notification(methods::INITIALIZED, None)
    }

    /// `tools/list` request (no params)
    pub fn tools_list(id: u64) -> Self {
        Self::call(id, methods::TOOLS_LIST, None)
    }

    /// `tools/call` request for a named tool
    pub fn tool_call(id: u64, params: ToolCallParams) -> Self {
        Self::call(id, methods::TOOLS_CALL, serde_json::to_value(params).ok())
    }

    /// Whether the server is expected to answer this message
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

impl JsonRpcResponse {
    /// The echoed id as a sequence number, when it is one
    pub fn sequence_number(&self) -> Option<u64> {
        self.id.as_u64()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl ToolCallParams {
    /// Build tool call parameters from string arguments
    pub fn new<'a>(name: &str, arguments: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            name: name.to_string(),
            arguments: arguments
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        }
    }
}
