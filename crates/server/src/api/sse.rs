//! SSE session transport.
//!
//! `GET /sse` opens a session and streams protocol responses; clients post
//! requests to `POST /message`, which only enqueues them.
//!
//! Events emitted:
//! - `endpoint` -- once, the URL to post messages to
//! - `message`  -- one JSON-RPC response per event

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use querygate_mcp::{ChannelTransport, McpServer};

use crate::sessions::SessionGuard;
use crate::state::{server_info, AppState};

const SESSION_HEADER: &str = "mcp-session-id";

const CHANNEL_CAPACITY: usize = 32;

pub async fn sse(State(state): State<Arc<AppState>>) -> Response {
    let session_id = uuid::Uuid::new_v4().to_string();

    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    let server = McpServer::new(state.registry.clone()).with_info(server_info());
    let task_session = session_id.clone();
    tokio::spawn(async move {
        let mut transport = ChannelTransport::new(inbound_rx, outbound_tx);
        if let Err(e) = server.run(&mut transport).await {
            debug!(session = %task_session, error = %e, "Session server stopped");
        }
    });

    state.sessions.insert(session_id.clone(), inbound_tx);
    info!(session = %session_id, active = state.sessions.len(), "SSE session opened");

    let guard = SessionGuard::new(session_id.clone(), state.sessions.clone());
    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/message?sessionId={session_id}"));
    let messages = ReceiverStream::new(outbound_rx)
        .map(|msg| Event::default().event("message").data(msg));

    let events = stream::once(async move { endpoint })
        .chain(messages)
        .map(move |event| {
            // The guard lives as long as the stream.
            let _guard = &guard;
            Ok::<_, Infallible>(event)
        });

    (
        [(SESSION_HEADER, session_id)],
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Forward a JSON-RPC message to its session. Answers arrive over SSE.
/// Never waits: a full session inbox is answered with 503.
pub async fn message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(query.session_id)
        .or_else(|| body_session_id(&body));

    let Some(session_id) = session_id else {
        return error(StatusCode::BAD_REQUEST, "missing session id");
    };

    let Some(inbound) = state.sessions.get(&session_id) else {
        return error(StatusCode::NOT_FOUND, "session not found");
    };

    match inbound.try_send(body) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        // The client is not draining its event stream.
        Err(TrySendError::Full(_)) => {
            warn!(session = %session_id, "Session inbox full, rejecting message");
            error(StatusCode::SERVICE_UNAVAILABLE, "session busy")
        }
        // The stream went away after the lookup.
        Err(TrySendError::Closed(_)) => {
            state.sessions.remove(&session_id);
            error(StatusCode::NOT_FOUND, "session not found")
        }
    }
}

fn body_session_id(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("sessionId")?
        .as_str()
        .map(str::to_string)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}
