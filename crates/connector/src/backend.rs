//! Backend traits and the process-wide set of live connectors.
//!
//! Each connector is either live (`Some`) or disabled (`None`) for the whole
//! process lifetime. Tool dispatch checks liveness before every call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConnectorError;

/// One result row, keyed by column name.
pub type SqlRow = Map<String, Value>;

/// A relational backend that runs SQL text and returns rows as JSON objects.
#[async_trait]
pub trait SqlBackend: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, ConnectorError>;

    /// Release pooled connections. Errors are logged, never returned.
    async fn close(&self);
}

/// A document store addressed by collection name.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Run a find with the given filter, returning at most `limit` documents.
    async fn find(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: i64,
    ) -> Result<Vec<Value>, ConnectorError>;

    /// Run an aggregation pipeline verbatim.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Value>,
    ) -> Result<Vec<Value>, ConnectorError>;

    async fn list_collections(&self) -> Result<Vec<String>, ConnectorError>;

    async fn close(&self);
}

/// Parameters for a log search. `None` fields are left out of the backend
/// request so the backend applies its own default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSearchRequest {
    pub query: String,
    pub limit: u32,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub index: String,
    pub source: Option<String>,
}

/// Result of a log search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSearchPage {
    pub logs: Vec<Value>,
    pub total: usize,
    pub count: usize,
}

/// A log-search service.
#[async_trait]
pub trait LogBackend: Send + Sync {
    async fn search(&self, request: &LogSearchRequest) -> Result<LogSearchPage, ConnectorError>;

    /// Fetch a single log event by id. `Ok(None)` when nothing matches.
    async fn get(&self, id: &str) -> Result<Option<Value>, ConnectorError>;
}

/// The live backends of this process. A `None` slot means the connector is
/// disabled (not configured, or it failed its startup liveness check).
#[derive(Clone, Default)]
pub struct Backends {
    pub mysql: Option<Arc<dyn SqlBackend>>,
    pub mongo: Option<Arc<dyn DocumentBackend>>,
    pub logs: Option<Arc<dyn LogBackend>>,
}

/// Snapshot of which connectors are live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub mysql: bool,
    pub mongodb: bool,
    pub datadog: bool,
}

impl Backends {
    /// No live backends.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_mysql(mut self, backend: Arc<dyn SqlBackend>) -> Self {
        self.mysql = Some(backend);
        self
    }

    pub fn with_mongo(mut self, backend: Arc<dyn DocumentBackend>) -> Self {
        self.mongo = Some(backend);
        self
    }

    pub fn with_logs(mut self, backend: Arc<dyn LogBackend>) -> Self {
        self.logs = Some(backend);
        self
    }

    pub fn status(&self) -> BackendStatus {
        BackendStatus {
            mysql: self.mysql.is_some(),
            mongodb: self.mongo.is_some(),
            datadog: self.logs.is_some(),
        }
    }
}
