//! Mock connection registry for integration tests
//!
//! Serves the registry endpoints tollgate calls, from canned records, and
//! counts calls per endpoint. `POST /forward` streams a fixed SSE reply
//! when the target URL ends in `/stream` and echoes JSON otherwise.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::StreamExt as _;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Event-stream chunks sent by the mock forward endpoint, in order
pub const SSE_CHUNKS: [&str; 3] = [
    "data: {\"delta\":\"Pack\"}\n\n",
    "data: {\"delta\":\"light\"}\n\n",
    "data: [DONE]\n\n",
];

/// Delay before each streamed chunk
const CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Canned registry contents
#[derive(Default)]
pub struct RegistryFixture {
    pages: Vec<Vec<Value>>,
    connections: HashMap<String, Value>,
    subscriptions: HashMap<String, Value>,
    subscription_configs: HashMap<String, Value>,
}

impl RegistryFixture {
    /// Serve `pages` from `GET /connections`; every record is also
    /// reachable through `GET /connections/:id`
    pub fn with_pages(mut self, pages: Vec<Vec<Value>>) -> Self {
        for record in pages.iter().flatten() {
            if let Some(id) = record["connection_id"].as_str() {
                self.connections.insert(id.to_owned(), record.clone());
            }
        }
        self.pages = pages;
        self
    }

    /// A connection reachable by id but absent from the list
    pub fn with_connection(mut self, record: Value) -> Self {
        let id = record["connection_id"].as_str().expect("connection_id").to_owned();
        self.connections.insert(id, record);
        self
    }

    /// The `subscription` object returned for a connection
    pub fn with_subscription(mut self, connection_id: &str, subscription: Value) -> Self {
        self.subscriptions.insert(connection_id.to_owned(), subscription);
        self
    }

    pub fn with_subscription_config(mut self, id: &str, config: Value) -> Self {
        self.subscription_configs.insert(id.to_owned(), config);
        self
    }
}

/// A registry connection record with secret `cs_<id>` and wallet `wal_<id>`
pub fn connection(id: &str, email: &str, subscription_config_id: &str, status: &str, created_at: &str) -> Value {
    json!({
        "connection_id": id,
        "connection_secret": format!("cs_{id}"),
        "customer": { "email": email },
        "subscription": { "subscription_config_id": subscription_config_id, "status": status },
        "wallet_id": format!("wal_{id}"),
        "created_at": created_at,
    })
}

/// A running mock registry
pub struct MockRegistry {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockRegistryState>,
}

struct MockRegistryState {
    fixture: RegistryFixture,
    list_count: AtomicU32,
    connection_count: AtomicU32,
    forward_count: AtomicU32,
    checkout_requests: Mutex<Vec<Value>>,
    forward_requests: Mutex<Vec<ForwardRequest>>,
}

/// What the mock forward endpoint received
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub target: String,
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl MockRegistry {
    /// Start the mock server, returning immediately
    pub async fn start(fixture: RegistryFixture) -> anyhow::Result<Self> {
        let state = Arc::new(MockRegistryState {
            fixture,
            list_count: AtomicU32::new(0),
            connection_count: AtomicU32::new(0),
            forward_count: AtomicU32::new(0),
            checkout_requests: Mutex::new(Vec::new()),
            forward_requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/connections", routing::get(handle_list))
            .route("/connections/{id}", routing::get(handle_connection))
            .route("/connections/{id}/subscription", routing::get(handle_subscription))
            .route("/subscription_configs/{id}", routing::get(handle_subscription_config))
            .route("/checkout_sessions", routing::post(handle_checkout))
            .route("/forward", routing::post(handle_forward))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL to configure as `registry.base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Number of `GET /connections` calls
    pub fn list_count(&self) -> u32 {
        self.state.list_count.load(Ordering::SeqCst)
    }

    /// Number of `GET /connections/:id` calls
    pub fn connection_count(&self) -> u32 {
        self.state.connection_count.load(Ordering::SeqCst)
    }

    pub fn forward_count(&self) -> u32 {
        self.state.forward_count.load(Ordering::SeqCst)
    }

    /// Bodies received by `POST /checkout_sessions`
    pub fn checkout_requests(&self) -> Vec<Value> {
        self.state.checkout_requests.lock().expect("lock").clone()
    }

    pub fn forward_requests(&self) -> Vec<ForwardRequest> {
        self.state.forward_requests.lock().expect("lock").clone()
    }
}

impl Drop for MockRegistry {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[derive(Deserialize)]
struct ListQuery {
    cursor: Option<String>,
    limit: Option<u32>,
}

async fn handle_list(State(state): State<Arc<MockRegistryState>>, Query(query): Query<ListQuery>) -> Response {
    state.list_count.fetch_add(1, Ordering::SeqCst);

    if query.limit != Some(100) {
        return (StatusCode::BAD_REQUEST, "limit must be 100").into_response();
    }

    let index = query
        .cursor
        .as_deref()
        .and_then(|cursor| cursor.strip_prefix("page_"))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);

    let pages = &state.fixture.pages;
    let data = pages.get(index).cloned().unwrap_or_default();
    let has_more = index + 1 < pages.len();

    Json(json!({
        "data": data,
        "has_more": has_more,
        "next_cursor": has_more.then(|| format!("page_{}", index + 1)),
    }))
    .into_response()
}

async fn handle_connection(State(state): State<Arc<MockRegistryState>>, Path(id): Path<String>) -> Response {
    state.connection_count.fetch_add(1, Ordering::SeqCst);

    match state.fixture.connections.get(&id) {
        Some(record) => Json(record.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "connection not found").into_response(),
    }
}

async fn handle_subscription(State(state): State<Arc<MockRegistryState>>, Path(id): Path<String>) -> Json<Value> {
    let subscription = state.fixture.subscriptions.get(&id).cloned().unwrap_or(Value::Null);
    Json(json!({ "subscription": subscription }))
}

async fn handle_subscription_config(State(state): State<Arc<MockRegistryState>>, Path(id): Path<String>) -> Response {
    match state.fixture.subscription_configs.get(&id) {
        Some(config) => Json(config.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "subscription config not found").into_response(),
    }
}

async fn handle_checkout(State(state): State<Arc<MockRegistryState>>, Json(body): Json<Value>) -> Json<Value> {
    let n = {
        let mut requests = state.checkout_requests.lock().expect("lock");
        requests.push(body);
        requests.len()
    };

    Json(json!({
        "checkout_session_id": format!("chk_{n}"),
        "checkout_session_token": format!("chk_tok_{n}"),
    }))
}

#[derive(Deserialize)]
struct ForwardQuery {
    u: String,
}

async fn handle_forward(
    State(state): State<Arc<MockRegistryState>>,
    Query(query): Query<ForwardQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.forward_count.fetch_add(1, Ordering::SeqCst);
    state.forward_requests.lock().expect("lock").push(ForwardRequest {
        target: query.u.clone(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned),
        body: body.clone(),
    });

    if query.u.ends_with("/stream") {
        let chunks = futures_util::stream::iter(SSE_CHUNKS).then(|chunk| async move {
            tokio::time::sleep(CHUNK_DELAY).await;
            Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))
        });

        return ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(chunks)).into_response();
    }

    if query.u.ends_with("/text") {
        return (StatusCode::ACCEPTED, "queued").into_response();
    }

    let echoed: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (StatusCode::OK, Json(json!({ "target": query.u, "echo": echoed }))).into_response()
}
