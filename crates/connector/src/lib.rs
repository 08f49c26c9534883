//! Backend connectors for querygate.
//!
//! - **backend**: `SqlBackend`, `DocumentBackend`, `LogBackend` traits and `Backends`
//! - **mysql**: sqlx MySQL pool
//! - **mongo**: MongoDB client
//! - **datadog**: Datadog Logs HTTP API
//! - **lifecycle**: connect at startup, close at shutdown

pub mod backend;
pub mod datadog;
pub mod error;
pub mod lifecycle;
pub mod mongo;
pub mod mysql;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use backend::{
    BackendStatus, Backends, DocumentBackend, LogBackend, LogSearchPage, LogSearchRequest,
    SqlBackend, SqlRow,
};
pub use error::ConnectorError;
pub use lifecycle::{connect_all, shutdown};
