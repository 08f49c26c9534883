//! Stateless JSON-RPC handler behind `POST /mcp`.
//!
//! Unlike the session server, tool failures become JSON-RPC error objects:
//! `-32601` when the tool cannot be resolved, `-32603` otherwise.

use std::sync::Arc;

use serde_json::{json, Value};

use querygate_tool_runtime::ToolRegistry;

use crate::envelope::parse_body;
use crate::error::McpError;
use crate::server::{call_params, initialize_result, list_tools_result, to_response};
use crate::types::*;

/// Outcome of one stateless call. `Rejected` envelopes map to HTTP 400.
#[derive(Debug)]
pub enum RpcReply {
    Handled(JsonRpcResponse),
    Rejected(JsonRpcResponse),
}

pub struct RpcHandler {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl RpcHandler {
    pub fn new(registry: Arc<ToolRegistry>, info: ServerInfo) -> Self {
        Self { registry, info }
    }

    pub async fn handle_body(&self, body: &[u8]) -> RpcReply {
        match parse_body(body) {
            Ok(request) => RpcReply::Handled(self.handle(&request).await),
            Err(rejection) => RpcReply::Rejected(rejection),
        }
    }

    pub async fn handle(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        tracing::debug!(method = %request.method, "Handling stateless request");

        match request.method.as_str() {
            "initialize" => to_response(id, &initialize_result(&self.info)),
            "notifications/initialized" => JsonRpcResponse::ack(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => to_response(id, &list_tools_result(&self.registry)),
            "tools/call" => match self.call_tool(&request.params).await {
                Ok(result) => to_response(id, &result),
                Err(err) => JsonRpcResponse::error(id, err.code(), err.to_string()),
            },
            method => {
                let err = McpError::MethodNotFound(method.to_string());
                JsonRpcResponse::error(id, err.code(), err.to_string())
            }
        }
    }

    async fn call_tool(&self, params: &Option<Value>) -> Result<CallToolResult, McpError> {
        let call = call_params(params)?;
        let output = self.registry.invoke(&call.name, call.arguments).await?;
        Ok(CallToolResult::text(output.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querygate_connector::mock::{MockLogs, MockSql};
    use querygate_connector::Backends;

    fn handler(backends: Backends) -> RpcHandler {
        RpcHandler::new(
            Arc::new(ToolRegistry::new(backends)),
            ServerInfo::new("querygate", "0.1.0"),
        )
    }

    async fn handled(handler: &RpcHandler, body: Value) -> JsonRpcResponse {
        match handler.handle_body(body.to_string().as_bytes()).await {
            RpcReply::Handled(resp) => resp,
            RpcReply::Rejected(resp) => panic!("rejected: {resp:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found() {
        let h = handler(Backends::none());
        let resp = handled(
            &h,
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
                   "params": {"name": "drop_db", "arguments": {}}}),
        )
        .await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::METHOD_NOT_FOUND);
        assert_eq!(err.message, "Unknown tool: drop_db");
    }

    #[tokio::test]
    async fn test_disabled_backend_is_method_not_found() {
        let h = handler(Backends::none().with_mysql(Arc::new(MockSql::default())));
        let resp = handled(
            &h,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "logs_search", "arguments": {}}}),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_failure_is_internal_error() {
        let h = handler(Backends::none().with_mysql(Arc::new(MockSql::failing("connection reset"))));
        let resp = handled(
            &h,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "mysql_list_tables"}}),
        )
        .await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, error_codes::INTERNAL_ERROR);
        assert!(err.message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_successful_call() {
        let h = handler(Backends::none().with_logs(Arc::new(MockLogs::with_logs(vec![
            json!({"id": "x1", "message": "boot"}),
        ]))));
        let resp = handled(
            &h,
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "logs_get", "arguments": {"id": "x1"}}}),
        )
        .await;
        let result: CallToolResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_missing_params() {
        let h = handler(Backends::none());
        let resp = handled(&h, json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call"})).await;
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_initialized_notification_echoes_id_only() {
        let h = handler(Backends::none());
        let resp = handled(
            &h,
            json!({"jsonrpc": "2.0", "id": 6, "method": "notifications/initialized"}),
        )
        .await;
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"jsonrpc": "2.0", "id": 6})
        );
    }

    #[tokio::test]
    async fn test_initialize_and_unknown_method() {
        let h = handler(Backends::none());
        let resp = handled(&h, json!({"jsonrpc": "2.0", "id": 7, "method": "initialize"})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "querygate");

        let resp = handled(&h, json!({"jsonrpc": "2.0", "id": 8, "method": "prompts/list"})).await;
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rejected_envelopes() {
        let h = handler(Backends::none());
        assert!(matches!(h.handle_body(b"nope").await, RpcReply::Rejected(_)));
        assert!(matches!(
            h.handle_body(br#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).await,
            RpcReply::Rejected(_)
        ));
    }
}
