//! HTTP router construction.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::{api, auth};

/// Build the application router. Everything except `/health` requires the API key.
pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/sse", get(api::sse))
        .route("/message", post(api::message))
        .route("/mcp", post(api::rpc))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(api::health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use querygate_connector::mock::{MockDocuments, MockSql};
    use querygate_connector::Backends;
    use querygate_tool_runtime::ToolRegistry;

    const KEY: &str = "test-key";

    fn app_with(backends: Backends, api_key: Option<&str>) -> (Router, Arc<AppState>) {
        let registry = Arc::new(ToolRegistry::new(backends));
        let state = Arc::new(AppState::new(api_key.map(str::to_string), registry));
        (build_router(state.clone()), state)
    }

    fn app() -> (Router, Arc<AppState>) {
        app_with(Backends::none().with_mysql(Arc::new(MockSql::default())), Some(KEY))
    }

    fn rpc_request(body: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/mcp").header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_key() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["server"], "querygate");
        assert_eq!(body["mongodb_enabled"], false);
        assert_eq!(body["mysql_enabled"], true);
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_health_reports_mongo_when_live() {
        let (app, _) = app_with(
            Backends::none().with_mongo(Arc::new(MockDocuments::default())),
            Some(KEY),
        );
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(resp).await["mongodb_enabled"], true);
    }

    #[tokio::test]
    async fn test_missing_or_wrong_key_is_unauthorized() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
        let (app, _) = app();

        let resp = app.clone().oneshot(rpc_request(body, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await, json!({"error": "unauthorized"}));

        let resp = app.oneshot(rpc_request(body, Some("nope"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unset_api_key_rejects_everything() {
        let (app, _) = app_with(Backends::none(), None);
        let resp = app
            .oneshot(rpc_request(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#, Some("")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_query_key_only_on_sse_routes() {
        let (app, _) = app();

        let resp = app
            .clone()
            .oneshot(
                Request::post(format!("/mcp?apiKey={KEY}"))
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        // Authenticated, but no session id anywhere.
        let resp = app
            .oneshot(
                Request::post(format!("/message?apiKey={KEY}"))
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "missing session id");
    }

    #[tokio::test]
    async fn test_tools_list_without_mongo() {
        let (app, _) = app();
        let resp = app
            .oneshot(rpc_request(
                r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
                Some(KEY),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        let names: Vec<&str> = body["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["mysql_query", "mysql_describe", "mysql_list_tables"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_method_not_found() {
        let (app, _) = app();
        let resp = app
            .oneshot(rpc_request(
                r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
                Some(KEY),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["id"], 9);
        assert_eq!(body["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_malformed_envelopes_are_bad_requests() {
        let (app, _) = app();

        let resp = app.clone().oneshot(rpc_request("{oops", Some(KEY))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"]["code"], -32700);

        let resp = app
            .oneshot(rpc_request(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#, Some(KEY)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_message_to_unknown_session_is_not_found() {
        let (app, _) = app();
        let resp = app
            .oneshot(
                Request::post("/message?sessionId=does-not-exist")
                    .header("x-api-key", KEY)
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["error"], "session not found");
    }

    #[tokio::test]
    async fn test_message_to_full_session_is_busy() {
        let (app, state) = app();
        let (inbound, _unread) = tokio::sync::mpsc::channel::<String>(1);
        inbound.try_send("queued".to_string()).unwrap();
        state.sessions.insert("stalled".to_string(), inbound);

        let resp = tokio::time::timeout(
            Duration::from_secs(1),
            app.oneshot(
                Request::post("/message?sessionId=stalled")
                    .header("x-api-key", KEY)
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
                    .unwrap(),
            ),
        )
        .await
        .expect("POST /message blocked on a full session")
        .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(resp).await["error"], "session busy");
        // Busy sessions stay registered.
        assert!(state.sessions.get("stalled").is_some());
    }

    async fn next_chunk(body: &mut Body) -> String {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("timed out waiting for SSE frame")
            .expect("stream ended")
            .unwrap();
        String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_sse_session_roundtrip_and_cleanup() {
        let (app, state) = app();

        let resp = app
            .clone()
            .oneshot(
                Request::get("/sse")
                    .header("x-api-key", KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let session_id = resp.headers()["mcp-session-id"].to_str().unwrap().to_string();
        assert!(state.sessions.get(&session_id).is_some());

        let mut body = resp.into_body();
        let endpoint = next_chunk(&mut body).await;
        assert!(endpoint.contains("event: endpoint"));
        assert!(endpoint.contains(&format!("/message?sessionId={session_id}")));

        let post = app
            .clone()
            .oneshot(
                Request::post("/message")
                    .header("x-api-key", KEY)
                    .header("mcp-session-id", &session_id)
                    .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(post.status(), StatusCode::ACCEPTED);

        let message = next_chunk(&mut body).await;
        assert!(message.contains("event: message"));
        assert!(message.contains("mysql_list_tables"));

        // Client disconnects: the session disappears immediately.
        drop(body);
        assert!(state.sessions.get(&session_id).is_none());

        let resp = app
            .oneshot(
                Request::post("/message")
                    .header("x-api-key", KEY)
                    .body(Body::from(format!(
                        r#"{{"jsonrpc":"2.0","id":2,"method":"ping","sessionId":"{session_id}"}}"#
                    )))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
