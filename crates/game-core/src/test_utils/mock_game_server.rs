// src/test_utils/mock_game_server.rs
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::ClientConfig;

pub const TOKEN_PATH: &str = "/api/accesses/tokens";
pub const AGENTS_PATH: &str = "/v2/agents";
pub const WORKERS_PATH: &str = "/v2/workers";
pub const TEST_AGENT_ID: &str = "test_agent_id";
pub const TEST_MAP_ID: &str = "test_map_id";
pub const TEST_TOKEN: &str = "test_token";

pub fn actions_path(agent_id: &str) -> String {
    format!("/v2/agents/{}/actions", agent_id)
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    /// A 200 response wrapping `data` in the service envelope.
    pub fn data(data: Value) -> Self {
        Self::json(200, json!({ "data": data }))
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HashMap<String, String>,
    /// Decoded JSON body, `Value::Null` when the body was not JSON.
    pub body: Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }
}

#[derive(Clone, Default)]
struct MockServerState {
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    sticky: Arc<Mutex<HashMap<String, MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServerState {
    fn next_response(&self, path: &str) -> Option<MockResponse> {
        if let Some(response) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
        {
            return Some(response);
        }
        self.sticky.lock().unwrap().get(path).cloned()
    }
}

async fn game_api_handler(
    State(state): State<MockServerState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let recorded = RecordedRequest {
        path: path.clone(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect(),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    log::debug!("Mock GAME server received {}: {}", path, recorded.body);
    state.requests.lock().unwrap().push(recorded);

    let Some(response) = state.next_response(&path) else {
        log::error!("Mock GAME server has no response configured for {}", path);
        return (StatusCode::NOT_FOUND, "no mock response configured").into_response();
    };

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}

/// In-process stand-in for the GAME API.
///
/// Token exchange, agent creation and worker registration answer with fixed
/// identifiers by default; the action endpoint must be scripted by the test.
pub struct MockGameServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    state: MockServerState,
}

impl MockGameServer {
    pub async fn start() -> Self {
        let state = MockServerState::default();
        {
            let mut sticky = state.sticky.lock().unwrap();
            sticky.insert(
                TOKEN_PATH.to_string(),
                MockResponse::data(json!({ "accessToken": TEST_TOKEN })),
            );
            sticky.insert(
                AGENTS_PATH.to_string(),
                MockResponse::data(json!({ "id": TEST_AGENT_ID })),
            );
            sticky.insert(
                WORKERS_PATH.to_string(),
                MockResponse::data(json!({ "id": TEST_MAP_ID })),
            );
        }

        let app = Router::new()
            .fallback(game_api_handler)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock GAME server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock GAME server error: {}", e);
                });
        });

        MockGameServer {
            addr,
            shutdown_tx,
            state,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new("test_api_key")
            .with_api_base_url(self.address())
            .with_request_timeout(5)
    }

    /// Answer every request to `path` with `response` once the queue is empty.
    pub fn set_response(&self, path: &str, response: MockResponse) {
        self.state
            .sticky
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    /// Queue a one-shot response; queued responses are served in order before the sticky one.
    pub fn enqueue(&self, path: &str, response: MockResponse) {
        self.state
            .queued
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn enqueue_action(&self, agent_id: &str, action: Value) {
        self.enqueue(&actions_path(agent_id), MockResponse::data(action));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    pub fn call_count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock GAME server shutdown signal already sent or receiver dropped.");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Base URL of a local port with nothing listening on it.
pub fn unused_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
