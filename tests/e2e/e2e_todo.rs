use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use bytes::Bytes;
use serde_json::{Value, json};
use todo_smoke::{Client, RequestIssuer, RestError, render_pretty};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Captured {
    content_type: Option<String>,
    accept: Option<String>,
    body: Bytes,
}

#[derive(Clone, Default)]
struct AppState {
    captured: Arc<Mutex<Vec<Captured>>>,
}

#[tokio::test]
async fn e2e_post_roundtrip_prints_server_document() {
    let server = TestServer::start().await;
    let issuer = RequestIssuer::with_endpoint(
        Client::new().expect("http client"),
        server.url("/backend/todo/"),
    );

    let document = issuer.issue().await.expect("todo post should succeed");
    let rendered = render_pretty(&document).expect("render");

    assert_eq!(rendered, "{\n    \"status\": \"ok\",\n    \"id\": 42\n}");

    let captured = server.captured();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(captured[0].accept.as_deref(), Some("application/json"));
    let body: Value = serde_json::from_slice(&captured[0].body).expect("request body json");
    assert_eq!(body, json!({"text": "Delete this task created by a python script"}));
}

#[tokio::test]
async fn e2e_empty_reply_fails_to_parse() {
    let server = TestServer::start().await;
    let issuer = RequestIssuer::with_endpoint(
        Client::new().expect("http client"),
        server.url("/backend/empty/"),
    );

    let err = issuer.issue().await.expect_err("empty reply should fail");

    assert!(matches!(err, RestError::Json { status: 204, .. }), "{err}");
}

#[tokio::test]
async fn e2e_unreachable_server_is_a_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let issuer = RequestIssuer::with_endpoint(
        Client::new().expect("http client"),
        format!("http://{addr}/backend/todo/"),
    );

    let err = issuer.issue().await.expect_err("closed port should fail");

    assert!(matches!(err, RestError::Connect { .. }), "{err}");
}

struct TestServer {
    base_url: String,
    state: AppState,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/backend/todo/", post(create_todo))
            .route("/backend/empty/", post(empty_reply))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url,
            state,
            task,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn captured(&self) -> Vec<Captured> {
        self.state
            .captured
            .lock()
            .expect("captured requests mutex")
            .clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], &'static str) {
    state
        .captured
        .lock()
        .expect("captured requests mutex")
        .push(Captured {
            content_type: header_string(&headers, header::CONTENT_TYPE),
            accept: header_string(&headers, header::ACCEPT),
            body,
        });
    (
        StatusCode::CREATED,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"status":"ok","id":42}"#,
    )
}

async fn empty_reply() -> StatusCode {
    StatusCode::NO_CONTENT
}
