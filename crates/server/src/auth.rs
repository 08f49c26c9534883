//! Shared-secret authentication for every route except `/health`.

use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Routes where the key may also arrive as `?apiKey=`, since browser
/// `EventSource` clients cannot set headers.
const QUERY_KEY_ROUTES: [&str; 2] = ["/sse", "/message"];

#[derive(Deserialize)]
struct KeyQuery {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
}

pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            if QUERY_KEY_ROUTES.contains(&req.uri().path()) {
                Query::<KeyQuery>::try_from_uri(req.uri())
                    .ok()
                    .and_then(|Query(q)| q.api_key)
            } else {
                None
            }
        });

    match (&state.api_key, provided) {
        (Some(expected), Some(provided)) if *expected == provided => next.run(req).await,
        _ => {
            tracing::debug!(path = %req.uri().path(), "Rejected unauthenticated request");
            (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response()
        }
    }
}
