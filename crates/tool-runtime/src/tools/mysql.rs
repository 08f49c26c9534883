//! MySQL tools: read-only query, describe table, list tables.

use serde_json::json;
use tracing::debug;

use querygate_connector::SqlBackend;

use crate::tool::{ToolDefinition, ToolError, ToolResult};

const READ_ONLY_PREFIXES: [&str; 3] = ["select", "show", "describe"];

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "mysql_query".to_string(),
            description: "Execute a read-only SQL query (SELECT, SHOW, DESCRIBE) against MySQL."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "SQL query to execute"
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "mysql_describe".to_string(),
            description: "Show the column structure of a MySQL table.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "table": {
                        "type": "string",
                        "description": "Table name"
                    }
                },
                "required": ["table"]
            }),
        },
        ToolDefinition {
            name: "mysql_list_tables".to_string(),
            description: "List all tables in the MySQL database.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

/// Prefix check only. Trailing statements or `SELECT ... INTO OUTFILE`
/// still pass; real read-only enforcement belongs to the database grants.
pub fn is_read_only(query: &str) -> bool {
    let normalized = query.trim().to_lowercase();
    READ_ONLY_PREFIXES
        .iter()
        .any(|prefix| normalized.starts_with(prefix))
}

/// Keep only `[A-Za-z0-9_]`.
pub fn sanitize_table_name(table: &str) -> Result<String, ToolError> {
    let clean: String = table
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if clean.is_empty() {
        return Err(ToolError::InvalidInput(format!(
            "table name '{table}' has no valid characters"
        )));
    }
    Ok(clean)
}

pub async fn query(db: &dyn SqlBackend, sql: &str) -> Result<ToolResult, ToolError> {
    if !is_read_only(sql) {
        return Err(ToolError::ReadOnlyViolation);
    }
    run(db, sql).await
}

pub async fn describe(db: &dyn SqlBackend, table: &str) -> Result<ToolResult, ToolError> {
    let table = sanitize_table_name(table)?;
    run(db, &format!("DESCRIBE {table}")).await
}

pub async fn list_tables(db: &dyn SqlBackend) -> Result<ToolResult, ToolError> {
    run(db, "SHOW TABLES").await
}

async fn run(db: &dyn SqlBackend, sql: &str) -> Result<ToolResult, ToolError> {
    let rows = db.query(sql).await?;
    debug!(rows = rows.len(), "mysql query complete");
    Ok(ToolResult {
        content: serde_json::to_string_pretty(&rows)?,
    })
}
