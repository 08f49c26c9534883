//! Log-search tools backed by Datadog Logs.

use serde_json::json;
use tracing::debug;

use querygate_connector::{LogBackend, LogSearchRequest};

use crate::tool::{ToolDefinition, ToolError, ToolResult};

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "logs_search".to_string(),
            description: "Search logs using Datadog query syntax, newest first.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query (default '*')"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum events to return (default 100, max 1000)"
                    },
                    "timeFrom": {
                        "type": "string",
                        "description": "Start time, e.g. 'now-1h' or an ISO-8601 timestamp"
                    },
                    "timeTo": {
                        "type": "string",
                        "description": "End time, e.g. 'now' or an ISO-8601 timestamp"
                    },
                    "index": {
                        "type": "string",
                        "description": "Log index (default 'logs')"
                    },
                    "source": {
                        "type": "string",
                        "description": "Restrict results to one log source"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "logs_get".to_string(),
            description: "Fetch a single log event by id.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "Log event id"
                    }
                },
                "required": ["id"]
            }),
        },
    ]
}

pub async fn search(
    logs: &dyn LogBackend,
    request: &LogSearchRequest,
) -> Result<ToolResult, ToolError> {
    let page = logs.search(request).await?;
    debug!(query = %request.query, count = page.count, "log search complete");
    Ok(ToolResult {
        content: serde_json::to_string_pretty(&page)?,
    })
}

pub async fn get(logs: &dyn LogBackend, id: &str) -> Result<ToolResult, ToolError> {
    match logs.get(id).await? {
        Some(event) => Ok(ToolResult {
            content: serde_json::to_string_pretty(&event)?,
        }),
        None => Err(ToolError::NotFound(format!("log not found: {id}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querygate_connector::mock::MockLogs;
    use serde_json::Value;

    fn request(limit: u32) -> LogSearchRequest {
        LogSearchRequest {
            query: "service:api".into(),
            limit,
            time_from: Some("now-1h".into()),
            time_to: None,
            index: "logs".into(),
            source: None,
        }
    }

    #[tokio::test]
    async fn test_search_returns_page_shape() {
        let backend = MockLogs::with_logs(vec![
            json!({"id": "a", "message": "one"}),
            json!({"id": "b", "message": "two"}),
            json!({"id": "c", "message": "three"}),
        ]);

        let result = search(&backend, &request(2)).await.unwrap();
        let page: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(page["count"], 2);
        assert_eq!(page["total"], 2);
        assert_eq!(page["logs"][1]["id"], "b");
        assert_eq!(backend.requests(), vec![request(2)]);
    }

    #[tokio::test]
    async fn test_get_found_and_missing() {
        let backend = MockLogs::with_logs(vec![json!({"id": "AAA", "message": "hi"})]);

        let result = get(&backend, "AAA").await.unwrap();
        assert!(result.content.contains("\"message\": \"hi\""));

        let err = get(&backend, "ZZZ").await.unwrap_err();
        assert_eq!(err.to_string(), "log not found: ZZZ");
    }
}
