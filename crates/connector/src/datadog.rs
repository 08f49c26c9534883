//! Datadog Logs connector over the public HTTP API.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use querygate_core::config::DatadogConfig;

use crate::backend::{LogBackend, LogSearchPage, LogSearchRequest};
use crate::error::ConnectorError;

pub struct DatadogConnector {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    app_key: String,
}

impl DatadogConnector {
    /// Build the client and validate the API key against `/api/v1/validate`.
    pub async fn connect(config: &DatadogConfig) -> Result<Self, ConnectorError> {
        let (api_key, app_key) = config.credentials()?;
        let connector = Self {
            client: reqwest::Client::new(),
            base_url: config.base_url(),
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
        };

        let resp = connector
            .client
            .get(format!("{}/api/v1/validate", connector.base_url))
            .header("DD-API-KEY", &connector.api_key)
            .send()
            .await?;
        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConnectorError::Api { status, body });
        }

        info!(site = %config.site, "Datadog Logs connected");
        Ok(connector)
    }

    async fn post_search(&self, body: &Value) -> Result<Vec<Value>, ConnectorError> {
        let url = format!("{}/api/v2/logs/events/search", self.base_url);
        debug!("Datadog request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("DD-API-KEY", &self.api_key)
            .header("DD-APPLICATION-KEY", &self.app_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Api { status, body });
        }

        let resp: Value = response.json().await?;
        match resp.get("data") {
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(ConnectorError::Parse(format!("unexpected data field: {other}"))),
        }
    }
}

#[async_trait]
impl LogBackend for DatadogConnector {
    async fn search(&self, request: &LogSearchRequest) -> Result<LogSearchPage, ConnectorError> {
        let body = search_body(request);
        let items = self.post_search(&body).await?;
        let logs: Vec<Value> = items.iter().map(flatten_event).collect();
        Ok(LogSearchPage {
            total: items.len(),
            count: logs.len(),
            logs,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Value>, ConnectorError> {
        let body = json!({
            "filter": { "query": id_query(id) },
            "page": { "limit": 1 },
        });
        let items = self.post_search(&body).await?;
        Ok(items.first().map(flatten_event))
    }
}

/// Exact-match query for one event id. Quotes and backslashes are dropped so
/// the id cannot terminate or escape the quoted term.
fn id_query(id: &str) -> String {
    format!("id:\"{}\"", id.replace(['"', '\\'], ""))
}

/// Build the `/api/v2/logs/events/search` body. Optional fields are omitted
/// entirely when unset.
pub(crate) fn search_body(request: &LogSearchRequest) -> Value {
    let query = match &request.source {
        Some(source) => format!("{} source:{}", request.query, source),
        None => request.query.clone(),
    };

    let mut filter = Map::new();
    filter.insert("query".to_string(), Value::String(query));
    filter.insert("indexes".to_string(), json!([request.index]));
    if let Some(from) = &request.time_from {
        filter.insert("from".to_string(), Value::String(from.clone()));
    }
    if let Some(to) = &request.time_to {
        filter.insert("to".to_string(), Value::String(to.clone()));
    }

    json!({
        "filter": filter,
        "sort": "-timestamp",
        "page": { "limit": request.limit },
    })
}

/// Lift the interesting attributes of a Logs API event to the top level.
fn flatten_event(event: &Value) -> Value {
    let attrs = event.get("attributes").cloned().unwrap_or(Value::Null);
    json!({
        "id": event.get("id").cloned().unwrap_or(Value::Null),
        "timestamp": attrs.get("timestamp").cloned().unwrap_or(Value::Null),
        "message": attrs.get("message").cloned().unwrap_or(Value::Null),
        "service": attrs.get("service").cloned().unwrap_or(Value::Null),
        "status": attrs.get("status").cloned().unwrap_or(Value::Null),
        "host": attrs.get("host").cloned().unwrap_or(Value::Null),
        "tags": attrs.get("tags").cloned().unwrap_or_else(|| json!([])),
        "attributes": attrs.get("attributes").cloned().unwrap_or_else(|| json!({})),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LogSearchRequest {
        LogSearchRequest {
            query: "status:error".to_string(),
            limit: 50,
            time_from: None,
            time_to: None,
            index: "logs".to_string(),
            source: None,
        }
    }

    #[test]
    fn test_search_body_omits_unset_fields() {
        let body = search_body(&request());
        let filter = body["filter"].as_object().unwrap();
        assert!(!filter.contains_key("from"));
        assert!(!filter.contains_key("to"));
        assert_eq!(filter["query"], "status:error");
        assert_eq!(filter["indexes"], json!(["logs"]));
        assert_eq!(body["sort"], "-timestamp");
        assert_eq!(body["page"]["limit"], 50);
    }

    #[test]
    fn test_search_body_includes_time_range_and_source() {
        let mut req = request();
        req.time_from = Some("now-1h".to_string());
        req.time_to = Some("now".to_string());
        req.source = Some("nginx".to_string());

        let body = search_body(&req);
        assert_eq!(body["filter"]["from"], "now-1h");
        assert_eq!(body["filter"]["to"], "now");
        assert_eq!(body["filter"]["query"], "status:error source:nginx");
    }

    #[test]
    fn test_id_query_strips_quotes_and_backslashes() {
        assert_eq!(id_query("AQAAAYx"), r#"id:"AQAAAYx""#);
        assert_eq!(id_query("abc\\"), r#"id:"abc""#);
        assert_eq!(id_query(r#"a" OR *"#), r#"id:"a OR *""#);
    }

    #[test]
    fn test_flatten_event() {
        let event = json!({
            "id": "AAAA",
            "type": "log",
            "attributes": {
                "timestamp": "2024-05-01T10:00:00Z",
                "message": "boom",
                "service": "api",
                "status": "error",
                "host": "web-1",
                "tags": ["env:prod"],
                "attributes": {"http": {"status_code": 500}}
            }
        });
        let flat = flatten_event(&event);
        assert_eq!(flat["id"], "AAAA");
        assert_eq!(flat["message"], "boom");
        assert_eq!(flat["attributes"]["http"]["status_code"], 500);
    }
}
