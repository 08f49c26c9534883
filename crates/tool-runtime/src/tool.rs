use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use querygate_connector::ConnectorError;

/// Describes a tool's interface for MCP clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name (e.g., "mysql_query", "logs_search")
    pub name: String,
    /// Human-readable description for the agent
    pub description: String,
    /// JSON Schema describing the expected input
    pub input_schema: Value,
}

/// Successful tool output: the text sent back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
}

/// The backend a tool runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    MySql,
    MongoDb,
    DatadogLogs,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::MySql => "MySQL",
            Backend::MongoDb => "MongoDB",
            Backend::DatadogLogs => "Datadog Logs",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("{0} is not configured or not connected")]
    BackendUnavailable(Backend),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("only read-only queries allowed")]
    ReadOnlyViolation,
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] ConnectorError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ToolError {
    /// True when the tool itself could not be resolved to a live handler,
    /// as opposed to a failure while running it.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, ToolError::UnknownTool(_) | ToolError::BackendUnavailable(_))
    }
}
