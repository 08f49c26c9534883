//! Tool names and their typed arguments.
//!
//! Every tool has exactly one argument variant. Raw JSON arguments are
//! deserialized into that variant before dispatch, so handlers never look at
//! untyped maps.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use querygate_connector::LogSearchRequest;

use crate::tool::{Backend, ToolError};

/// Maximum documents or log events returned by a single call.
pub const MAX_RESULTS: i64 = 1000;

/// Default for `limit` when the caller omits it.
pub const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    MysqlQuery,
    MysqlDescribe,
    MysqlListTables,
    MongoQuery,
    MongoAggregate,
    MongoListCollections,
    LogsSearch,
    LogsGet,
}

impl ToolName {
    /// All tools in listing order.
    pub const ALL: [ToolName; 8] = [
        ToolName::MysqlQuery,
        ToolName::MysqlDescribe,
        ToolName::MysqlListTables,
        ToolName::MongoQuery,
        ToolName::MongoAggregate,
        ToolName::MongoListCollections,
        ToolName::LogsSearch,
        ToolName::LogsGet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::MysqlQuery => "mysql_query",
            ToolName::MysqlDescribe => "mysql_describe",
            ToolName::MysqlListTables => "mysql_list_tables",
            ToolName::MongoQuery => "mongo_query",
            ToolName::MongoAggregate => "mongo_aggregate",
            ToolName::MongoListCollections => "mongo_list_collections",
            ToolName::LogsSearch => "logs_search",
            ToolName::LogsGet => "logs_get",
        }
    }

    pub fn backend(self) -> Backend {
        match self {
            ToolName::MysqlQuery | ToolName::MysqlDescribe | ToolName::MysqlListTables => {
                Backend::MySql
            }
            ToolName::MongoQuery | ToolName::MongoAggregate | ToolName::MongoListCollections => {
                Backend::MongoDb
            }
            ToolName::LogsSearch | ToolName::LogsGet => Backend::DatadogLogs,
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Validated arguments, one variant per tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    MysqlQuery { query: String },
    MysqlDescribe { table: String },
    MysqlListTables,
    MongoQuery { collection: String, filter: Map<String, Value>, limit: i64 },
    MongoAggregate { collection: String, pipeline: Vec<Value> },
    MongoListCollections,
    LogsSearch(LogSearchRequest),
    LogsGet { id: String },
}

#[derive(Deserialize)]
struct QueryInput {
    query: String,
}

#[derive(Deserialize)]
struct DescribeInput {
    table: String,
}

#[derive(Deserialize)]
struct FindInput {
    collection: String,
    #[serde(default)]
    filter: Map<String, Value>,
    limit: Option<f64>,
}

#[derive(Deserialize)]
struct AggregateInput {
    collection: String,
    pipeline: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogsSearchInput {
    query: Option<String>,
    limit: Option<f64>,
    time_from: Option<String>,
    time_to: Option<String>,
    index: Option<String>,
    source: Option<String>,
}

#[derive(Deserialize)]
struct LogsGetInput {
    id: Option<String>,
}

impl ToolArgs {
    /// Validate `arguments` against the input schema of `tool`.
    /// A missing (`null`) arguments value is treated as `{}`.
    pub fn parse(tool: ToolName, arguments: Value) -> Result<Self, ToolError> {
        let arguments = match arguments {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        let args = match tool {
            ToolName::MysqlQuery => {
                let input: QueryInput = decode(tool, arguments)?;
                ToolArgs::MysqlQuery { query: input.query }
            }
            ToolName::MysqlDescribe => {
                let input: DescribeInput = decode(tool, arguments)?;
                ToolArgs::MysqlDescribe { table: input.table }
            }
            ToolName::MysqlListTables => ToolArgs::MysqlListTables,
            ToolName::MongoQuery => {
                let input: FindInput = decode(tool, arguments)?;
                ToolArgs::MongoQuery {
                    collection: input.collection,
                    filter: input.filter,
                    limit: capped_limit(input.limit),
                }
            }
            ToolName::MongoAggregate => {
                let input: AggregateInput = decode(tool, arguments)?;
                ToolArgs::MongoAggregate {
                    collection: input.collection,
                    pipeline: input.pipeline,
                }
            }
            ToolName::MongoListCollections => ToolArgs::MongoListCollections,
            ToolName::LogsSearch => {
                let input: LogsSearchInput = decode(tool, arguments)?;
                ToolArgs::LogsSearch(LogSearchRequest {
                    query: input.query.unwrap_or_else(|| "*".to_string()),
                    // capped_limit is always within 1..=1000
                    limit: capped_limit(input.limit) as u32,
                    time_from: input.time_from,
                    time_to: input.time_to,
                    index: input.index.unwrap_or_else(|| "logs".to_string()),
                    source: input.source,
                })
            }
            ToolName::LogsGet => {
                let input: LogsGetInput = decode(tool, arguments)?;
                match input.id {
                    Some(id) if !id.is_empty() => ToolArgs::LogsGet { id },
                    _ => return Err(ToolError::InvalidInput("id is required".to_string())),
                }
            }
        };
        Ok(args)
    }
}

fn decode<T: for<'de> Deserialize<'de>>(tool: ToolName, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidInput(format!("{}: {}", tool.as_str(), e)))
}

/// `min(limit, 1000)`; absent or non-positive limits use the default.
fn capped_limit(limit: Option<f64>) -> i64 {
    match limit {
        Some(l) if l >= 1.0 => (l as i64).min(MAX_RESULTS),
        _ => DEFAULT_LIMIT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_name_roundtrip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!(matches!(
            "drop_everything".parse::<ToolName>(),
            Err(ToolError::UnknownTool(name)) if name == "drop_everything"
        ));
    }

    #[test]
    fn test_missing_required_field_is_invalid_input() {
        let err = ToolArgs::parse(ToolName::MysqlQuery, json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));

        let err = ToolArgs::parse(ToolName::MongoAggregate, json!({"collection": "c"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn test_mongo_query_defaults_and_cap() {
        let args = ToolArgs::parse(ToolName::MongoQuery, json!({"collection": "users"})).unwrap();
        assert_eq!(
            args,
            ToolArgs::MongoQuery {
                collection: "users".to_string(),
                filter: Map::new(),
                limit: 100,
            }
        );

        let args = ToolArgs::parse(
            ToolName::MongoQuery,
            json!({"collection": "users", "limit": 5000}),
        )
        .unwrap();
        assert!(matches!(args, ToolArgs::MongoQuery { limit: 1000, .. }));

        let args = ToolArgs::parse(
            ToolName::MongoQuery,
            json!({"collection": "users", "limit": 0}),
        )
        .unwrap();
        assert!(matches!(args, ToolArgs::MongoQuery { limit: 100, .. }));
    }

    #[test]
    fn test_logs_search_defaults() {
        let args = ToolArgs::parse(ToolName::LogsSearch, Value::Null).unwrap();
        assert_eq!(
            args,
            ToolArgs::LogsSearch(LogSearchRequest {
                query: "*".to_string(),
                limit: 100,
                time_from: None,
                time_to: None,
                index: "logs".to_string(),
                source: None,
            })
        );
    }

    #[test]
    fn test_logs_search_camel_case_fields() {
        let args = ToolArgs::parse(
            ToolName::LogsSearch,
            json!({"query": "service:api", "limit": 2500, "timeFrom": "now-1h", "source": "nginx"}),
        )
        .unwrap();
        let ToolArgs::LogsSearch(req) = args else { panic!("wrong variant") };
        assert_eq!(req.limit, 1000);
        assert_eq!(req.time_from.as_deref(), Some("now-1h"));
        assert_eq!(req.time_to, None);
        assert_eq!(req.source.as_deref(), Some("nginx"));
    }

    #[test]
    fn test_logs_get_requires_id() {
        let err = ToolArgs::parse(ToolName::LogsGet, json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: id is required");

        let args = ToolArgs::parse(ToolName::LogsGet, json!({"id": "AAA"})).unwrap();
        assert_eq!(args, ToolArgs::LogsGet { id: "AAA".to_string() });
    }
}
