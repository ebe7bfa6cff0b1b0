/// Message framing for newline-delimited JSON-RPC
///
/// Outbound envelopes become exactly one line; inbound lines are sorted into
/// responses, server-originated messages, and lines that are not JSON-RPC.

use serde_json::Value;

use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};

/// One line read from the server's output, classified
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A response to one of our requests
    Response(JsonRpcResponse),
    /// A notification or request initiated by the server
    ServerMessage {
        method: String,
        id: Option<Value>,
        params: Option<Value>,
    },
    /// Anything that is not a JSON-RPC object
    Malformed { line: String, reason: String },
}

/// Serialize a request to a JSON line (with trailing newline)
///
/// `serde_json::to_string` escapes control characters inside strings, so the
/// only newline in the result is the terminator.
pub fn frame_request(request: &JsonRpcRequest) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    Ok(line)
}

/// Classify a single line of server output
///
/// Returns `None` for blank lines, which carry no message.
pub fn parse_line(line: &str) -> Option<Inbound> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let malformed = |reason: String| Inbound::Malformed {
        line: trimmed.to_string(),
        reason,
    };

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(e) => return Some(malformed(e.to_string())),
    };

    let Value::Object(mut object) = value else {
        return Some(malformed("expected a JSON object".to_string()));
    };

    if let Some(method) = object.get("method").and_then(Value::as_str) {
        return Some(Inbound::ServerMessage {
            method: method.to_string(),
            id: object.remove("id"),
            params: object.remove("params"),
        });
    }

    if !object.contains_key("result") && !object.contains_key("error") {
        return Some(malformed("object has neither result, error nor method".to_string()));
    }

    Some(match serde_json::from_value::<JsonRpcResponse>(Value::Object(object)) {
        Ok(response) => Inbound::Response(response),
        Err(e) => malformed(e.to_string()),
    })
}
