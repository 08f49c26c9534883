//! In-memory backends for tests. Each mock records the calls it receives.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::backend::{
    DocumentBackend, LogBackend, LogSearchPage, LogSearchRequest, SqlBackend, SqlRow,
};
use crate::error::ConnectorError;

/// Returns the same rows for every query, or a canned error message.
#[derive(Default)]
pub struct MockSql {
    pub rows: Vec<SqlRow>,
    pub fail_with: Option<String>,
    pub queries: Mutex<Vec<String>>,
}

impl MockSql {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        Self { rows, ..Self::default() }
    }

    pub fn failing(message: &str) -> Self {
        Self { fail_with: Some(message.to_string()), ..Self::default() }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SqlBackend for MockSql {
    async fn query(&self, sql: &str) -> Result<Vec<SqlRow>, ConnectorError> {
        self.queries.lock().unwrap().push(sql.to_string());
        match &self.fail_with {
            Some(msg) => Err(ConnectorError::Parse(msg.clone())),
            None => Ok(self.rows.clone()),
        }
    }

    async fn close(&self) {}
}

/// Serves `total_docs` generated documents, honouring the requested limit.
#[derive(Default)]
pub struct MockDocuments {
    pub total_docs: usize,
    pub collections: Vec<String>,
    pub find_calls: Mutex<Vec<(String, Map<String, Value>, i64)>>,
    pub pipelines: Mutex<Vec<Vec<Value>>>,
}

impl MockDocuments {
    pub fn with_docs(total_docs: usize) -> Self {
        Self { total_docs, ..Self::default() }
    }

    pub fn find_calls(&self) -> Vec<(String, Map<String, Value>, i64)> {
        self.find_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentBackend for MockDocuments {
    async fn find(
        &self,
        collection: &str,
        filter: Map<String, Value>,
        limit: i64,
    ) -> Result<Vec<Value>, ConnectorError> {
        self.find_calls
            .lock()
            .unwrap()
            .push((collection.to_string(), filter, limit));
        let n = self.total_docs.min(usize::try_from(limit).unwrap_or(0));
        Ok((0..n).map(|i| json!({ "n": i })).collect())
    }

    async fn aggregate(
        &self,
        _collection: &str,
        pipeline: Vec<Value>,
    ) -> Result<Vec<Value>, ConnectorError> {
        let stages = pipeline.len();
        self.pipelines.lock().unwrap().push(pipeline);
        Ok(vec![json!({ "stages": stages })])
    }

    async fn list_collections(&self) -> Result<Vec<String>, ConnectorError> {
        Ok(self.collections.clone())
    }

    async fn close(&self) {}
}

/// Returns `logs` for every search and looks ids up among them.
#[derive(Default)]
pub struct MockLogs {
    pub logs: Vec<Value>,
    pub requests: Mutex<Vec<LogSearchRequest>>,
}

impl MockLogs {
    pub fn with_logs(logs: Vec<Value>) -> Self {
        Self { logs, ..Self::default() }
    }

    pub fn requests(&self) -> Vec<LogSearchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogBackend for MockLogs {
    async fn search(&self, request: &LogSearchRequest) -> Result<LogSearchPage, ConnectorError> {
        self.requests.lock().unwrap().push(request.clone());
        let logs: Vec<Value> = self.logs.iter().take(request.limit as usize).cloned().collect();
        Ok(LogSearchPage { total: logs.len(), count: logs.len(), logs })
    }

    async fn get(&self, id: &str) -> Result<Option<Value>, ConnectorError> {
        Ok(self.logs.iter().find(|l| l["id"] == id).cloned())
    }
}
