use serde_json::Value;
use tracing::{debug, warn};

use querygate_connector::{BackendStatus, Backends, DocumentBackend, LogBackend, SqlBackend};

use crate::args::{ToolArgs, ToolName};
use crate::tool::{Backend, ToolDefinition, ToolError, ToolResult};
use crate::tools::{logs, mongo, mysql};

/// Lists the tools the live backends support and dispatches calls to them.
/// Shared by every transport; cheap to wrap in an `Arc`.
pub struct ToolRegistry {
    backends: Backends,
}

impl ToolRegistry {
    pub fn new(backends: Backends) -> Self {
        Self { backends }
    }

    pub fn status(&self) -> BackendStatus {
        self.backends.status()
    }

    /// Descriptors in fixed order: MySQL, then MongoDB, then logs.
    /// MySQL tools are always listed; the others only when their backend is live.
    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut defs = mysql::definitions();
        if self.backends.mongo.is_some() {
            defs.extend(mongo::definitions());
        }
        if self.backends.logs.is_some() {
            defs.extend(logs::definitions());
        }
        defs
    }

    /// Resolve `name`, check its backend is live, validate `arguments`,
    /// then run the handler. No backend call is made unless all three pass.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolResult, ToolError> {
        let tool: ToolName = name.parse()?;
        self.ensure_live(tool.backend())?;
        let args = ToolArgs::parse(tool, arguments)?;

        debug!(tool = name, "invoking tool");
        let result = self.execute(args).await;
        if let Err(e) = &result {
            warn!(tool = name, error = %e, "tool call failed");
        }
        result
    }

    fn ensure_live(&self, backend: Backend) -> Result<(), ToolError> {
        match backend {
            Backend::MySql => self.mysql().map(|_| ()),
            Backend::MongoDb => self.mongo().map(|_| ()),
            Backend::DatadogLogs => self.logs().map(|_| ()),
        }
    }

    fn mysql(&self) -> Result<&dyn SqlBackend, ToolError> {
        self.backends
            .mysql
            .as_deref()
            .ok_or(ToolError::BackendUnavailable(Backend::MySql))
    }

    fn mongo(&self) -> Result<&dyn DocumentBackend, ToolError> {
        self.backends
            .mongo
            .as_deref()
            .ok_or(ToolError::BackendUnavailable(Backend::MongoDb))
    }

    fn logs(&self) -> Result<&dyn LogBackend, ToolError> {
        self.backends
            .logs
            .as_deref()
            .ok_or(ToolError::BackendUnavailable(Backend::DatadogLogs))
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolResult, ToolError> {
        match args {
            ToolArgs::MysqlQuery { query } => mysql::query(self.mysql()?, &query).await,
            ToolArgs::MysqlDescribe { table } => mysql::describe(self.mysql()?, &table).await,
            ToolArgs::MysqlListTables => mysql::list_tables(self.mysql()?).await,
            ToolArgs::MongoQuery { collection, filter, limit } => {
                mongo::find(self.mongo()?, &collection, filter, limit).await
            }
            ToolArgs::MongoAggregate { collection, pipeline } => {
                mongo::aggregate(self.mongo()?, &collection, pipeline).await
            }
            ToolArgs::MongoListCollections => mongo::list_collections(self.mongo()?).await,
            ToolArgs::LogsSearch(request) => logs::search(self.logs()?, &request).await,
            ToolArgs::LogsGet { id } => logs::get(self.logs()?, &id).await,
        }
    }
}
