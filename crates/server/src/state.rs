use std::sync::Arc;

use querygate_mcp::{RpcHandler, ServerInfo};
use querygate_tool_runtime::ToolRegistry;

use crate::sessions::SessionStore;

pub const SERVER_NAME: &str = "querygate";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
    /// Expected `X-API-Key`. `None` rejects every authenticated request.
    pub api_key: Option<String>,
    pub registry: Arc<ToolRegistry>,
    pub rpc: RpcHandler,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(api_key: Option<String>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            api_key,
            rpc: RpcHandler::new(registry.clone(), server_info()),
            registry,
            sessions: Arc::new(SessionStore::default()),
        }
    }
}

pub fn server_info() -> ServerInfo {
    ServerInfo::new(SERVER_NAME, VERSION)
}
