use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use querygate_mcp::{JsonRpcResponse, RpcReply};

use crate::state::AppState;

/// Stateless JSON-RPC endpoint. Malformed envelopes get HTTP 400; every
/// handled request, including JSON-RPC errors, gets 200.
pub async fn rpc(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> (StatusCode, Json<JsonRpcResponse>) {
    match state.rpc.handle_body(&body).await {
        RpcReply::Handled(resp) => (StatusCode::OK, Json(resp)),
        RpcReply::Rejected(resp) => (StatusCode::BAD_REQUEST, Json(resp)),
    }
}
