//! MongoDB tools: find, aggregate, list collections.
//!
//! Aggregation pipelines run verbatim. Unlike `mysql_query` there is no
//! allow-list, so `$out`/`$merge` stages reach the server untouched.

use serde_json::{json, Map, Value};
use tracing::debug;

use querygate_connector::DocumentBackend;

use crate::tool::{ToolDefinition, ToolError, ToolResult};

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "mongo_query".to_string(),
            description: "Find documents in a MongoDB collection.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "Collection name"
                    },
                    "filter": {
                        "type": "object",
                        "description": "MongoDB filter document (default {})"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum documents to return (default 100, max 1000)"
                    }
                },
                "required": ["collection"]
            }),
        },
        ToolDefinition {
            name: "mongo_aggregate".to_string(),
            description: "Run an aggregation pipeline on a MongoDB collection.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection": {
                        "type": "string",
                        "description": "Collection name"
                    },
                    "pipeline": {
                        "type": "array",
                        "description": "Aggregation pipeline stages"
                    }
                },
                "required": ["collection", "pipeline"]
            }),
        },
        ToolDefinition {
            name: "mongo_list_collections".to_string(),
            description: "List all collections in the MongoDB database.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

pub async fn find(
    db: &dyn DocumentBackend,
    collection: &str,
    filter: Map<String, Value>,
    limit: i64,
) -> Result<ToolResult, ToolError> {
    let docs = db.find(collection, filter, limit).await?;
    debug!(collection, docs = docs.len(), "mongo find complete");
    pretty(&docs)
}

pub async fn aggregate(
    db: &dyn DocumentBackend,
    collection: &str,
    pipeline: Vec<Value>,
) -> Result<ToolResult, ToolError> {
    let stages = pipeline.len();
    let docs = db.aggregate(collection, pipeline).await?;
    debug!(collection, stages, docs = docs.len(), "mongo aggregate complete");
    pretty(&docs)
}

pub async fn list_collections(db: &dyn DocumentBackend) -> Result<ToolResult, ToolError> {
    let names = db.list_collections().await?;
    pretty(&names)
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<ToolResult, ToolError> {
    Ok(ToolResult {
        content: serde_json::to_string_pretty(value)?,
    })
}
