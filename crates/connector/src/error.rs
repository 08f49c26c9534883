//! Error types for backend connectors.

use querygate_core::ConfigError;

/// Errors raised while connecting to or querying a backend.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// Backend settings are incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MySQL driver error (connect, ping, or query).
    #[error("MySQL error: {0}")]
    MySql(#[from] sqlx::Error),

    /// MongoDB driver error.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A filter or pipeline stage could not be converted to BSON.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// HTTP transport failure talking to the log-search API.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The log-search API answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The backend answered with something we could not interpret.
    #[error("failed to parse response: {0}")]
    Parse(String),
}
