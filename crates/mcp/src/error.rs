//! Error types for the MCP crate.

use querygate_tool_runtime::ToolError;

use crate::types::{error_codes, JsonRpcError};

/// Errors that can occur while handling MCP traffic.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Failed to parse JSON.
    #[error("Parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The message is JSON but not a valid JSON-RPC 2.0 request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport closed or failed.
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Unknown tool, or its backend is not live.
    #[error("{0}")]
    ToolNotFound(String),

    /// Tool ran and failed.
    #[error("{0}")]
    ToolExecution(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        if err.is_unresolved() {
            McpError::ToolNotFound(err.to_string())
        } else {
            McpError::ToolExecution(err.to_string())
        }
    }
}

impl McpError {
    pub fn code(&self) -> i64 {
        match self {
            McpError::JsonParse(_) => error_codes::PARSE_ERROR,
            McpError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::ToolNotFound(_) => {
                error_codes::METHOD_NOT_FOUND
            }
            McpError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            McpError::Transport(_) | McpError::ToolExecution(_) => error_codes::INTERNAL_ERROR,
        }
    }

    /// Convert to a JSON-RPC error object.
    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querygate_tool_runtime::Backend;

    #[test]
    fn test_tool_error_mapping() {
        let err: McpError = ToolError::UnknownTool("nope".into()).into();
        assert_eq!(err.code(), -32601);
        assert_eq!(err.to_string(), "Unknown tool: nope");

        let err: McpError = ToolError::BackendUnavailable(Backend::MongoDb).into();
        assert_eq!(err.code(), -32601);

        let err: McpError = ToolError::ReadOnlyViolation.into();
        assert_eq!(err.code(), -32603);
        assert_eq!(err.to_rpc_error().message, "only read-only queries allowed");
    }
}
