//! JSON-RPC envelope validation.
//!
//! A rejected envelope comes back as a ready-to-send error response that
//! echoes the request id when one could be read.

use serde_json::Value;

use crate::error::McpError;
use crate::types::{JsonRpcRequest, JsonRpcResponse, RpcId};

/// Parse raw bytes into a request. Non-JSON yields `-32700`.
pub fn parse_body(body: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let raw: Value = serde_json::from_slice(body).map_err(|e| {
        let err = McpError::JsonParse(e);
        JsonRpcResponse::error(None, err.code(), err.to_string())
    })?;
    parse_value(raw)
}

/// Validate an already-parsed value. Anything other than an object with
/// `jsonrpc: "2.0"` and a string `method` yields `-32600`.
pub fn parse_value(raw: Value) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let id = raw
        .get("id")
        .and_then(|id| serde_json::from_value::<RpcId>(id.clone()).ok());
    let reject = |reason: String| {
        let err = McpError::InvalidRequest(reason);
        JsonRpcResponse::error(id.clone(), err.code(), err.to_string())
    };

    if raw.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err(reject("jsonrpc must be \"2.0\"".to_string()));
    }
    serde_json::from_value(raw).map_err(|e| reject(e.to_string()))
}
