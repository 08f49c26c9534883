//! Session protocol server.
//!
//! One `McpServer` runs per SSE session over a `ChannelTransport`. Tool
//! failures are reported inside a successful response as
//! `{content:[{type:"text", text:"Error: ..."}], isError:true}`.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};

use querygate_tool_runtime::ToolRegistry;

use crate::envelope::parse_value;
use crate::error::McpError;
use crate::transport::McpTransport;
use crate::types::*;

/// MCP server that bridges a shared `ToolRegistry` to one session.
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            info: ServerInfo::new("querygate", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Override the name and version sent in `initialize`.
    pub fn with_info(mut self, info: ServerInfo) -> Self {
        self.info = info;
        self
    }

    /// Run the server loop until the transport is closed.
    ///
    /// Requests are handled concurrently: a slow tool call delays only its
    /// own response, so responses may arrive out of request order. Requests
    /// still in flight when the transport closes are answered before returning.
    pub async fn run<T: McpTransport>(&self, transport: &mut T) -> Result<(), McpError> {
        tracing::debug!(server = %self.info.name, "MCP session starting");

        let mut pending = FuturesUnordered::new();
        loop {
            tokio::select! {
                line = transport.receive() => {
                    let Some(line) = line? else { break };
                    tracing::debug!(message = %line, "Received message");
                    match classify(&line) {
                        Inbound::Request(request) => {
                            pending.push(async move { self.handle_request(&request).await });
                        }
                        Inbound::Reply(response) => send_response(transport, &response).await?,
                        Inbound::Ignore => {}
                    }
                }
                Some(response) = pending.next(), if !pending.is_empty() => {
                    send_response(transport, &response).await?;
                }
            }
        }

        while let Some(response) = pending.next().await {
            send_response(transport, &response).await?;
        }

        tracing::debug!("Transport closed, session ending");
        Ok(())
    }

    /// Handle a single JSON-RPC request and produce a response.
    pub async fn handle_request(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => {
                log_client(&request.params);
                to_response(id, &initialize_result(&self.info))
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => to_response(id, &list_tools_result(&self.registry)),
            "tools/call" => self.handle_call_tool(id, &request.params).await,
            method => {
                tracing::warn!(method = %method, "Unknown method");
                let err = McpError::MethodNotFound(method.to_string());
                JsonRpcResponse::error(id, err.code(), err.to_string())
            }
        }
    }

    async fn handle_call_tool(&self, id: Option<RpcId>, params: &Option<Value>) -> JsonRpcResponse {
        let call = match call_params(params) {
            Ok(call) => call,
            Err(err) => return JsonRpcResponse::error(id, err.code(), err.to_string()),
        };

        tracing::debug!(tool = %call.name, "Handling tools/call");

        let result = match self.registry.invoke(&call.name, call.arguments).await {
            Ok(output) => CallToolResult::text(output.content),
            Err(e) => CallToolResult::error(e),
        };
        to_response(id, &result)
    }
}

/// What the session loop does with one inbound line.
enum Inbound {
    /// A valid request, to be handled.
    Request(JsonRpcRequest),
    /// An immediate rejection (parse error or malformed envelope).
    Reply(JsonRpcResponse),
    /// A notification: never answered.
    Ignore,
}

fn classify(line: &str) -> Inbound {
    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse JSON");
            let err = McpError::JsonParse(e);
            return Inbound::Reply(JsonRpcResponse::error(None, err.code(), err.to_string()));
        }
    };

    // No "id" means notification.
    if raw.get("id").is_none() {
        if let Ok(notif) = serde_json::from_value::<JsonRpcNotification>(raw) {
            handle_notification(&notif);
        }
        return Inbound::Ignore;
    }

    match parse_value(raw) {
        Ok(request) => Inbound::Request(request),
        Err(rejection) => Inbound::Reply(rejection),
    }
}

async fn send_response<T: McpTransport>(
    transport: &mut T,
    response: &JsonRpcResponse,
) -> Result<(), McpError> {
    let json = serde_json::to_string(response)?;
    tracing::debug!(response = %json, "Sending response");
    transport.send(&json).await
}

fn handle_notification(notif: &JsonRpcNotification) {
    match notif.method.as_str() {
        "notifications/initialized" => tracing::info!("Client confirmed initialization"),
        "notifications/cancelled" => tracing::debug!("Client cancelled a request"),
        method => tracing::debug!(method = %method, "Unknown notification, ignoring"),
    }
}

fn log_client(params: &Option<Value>) {
    let client = params
        .clone()
        .and_then(|p| serde_json::from_value::<InitializeParams>(p).ok());
    if let Some(params) = client {
        let name = params.client_info.map(|c| c.name).unwrap_or_default();
        tracing::info!(client = %name, protocol = %params.protocol_version, "Client initializing");
    }
}

pub(crate) fn initialize_result(info: &ServerInfo) -> InitializeResult {
    InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: false }),
        },
        server_info: info.clone(),
    }
}

pub(crate) fn list_tools_result(registry: &ToolRegistry) -> ListToolsResult {
    ListToolsResult {
        tools: registry.list().into_iter().map(ToolInfo::from).collect(),
    }
}

pub(crate) fn call_params(params: &Option<Value>) -> Result<CallToolParams, McpError> {
    let params = params
        .as_ref()
        .ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(params.clone()).map_err(|e| McpError::InvalidParams(e.to_string()))
}

pub(crate) fn to_response<T: serde::Serialize>(id: Option<RpcId>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(val) => JsonRpcResponse::success(id, val),
        Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}
