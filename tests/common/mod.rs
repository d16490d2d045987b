//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use secrecy::SecretString;
use tokio::net::TcpListener;

use bookings_proxy::security::SignatureGate;
use bookings_proxy::{HttpServer, ServiceConfig, Shutdown};

pub const TEST_SECRET: &str = "integration-secret";
pub const UPSTREAM_USER: &str = "proxy-user";
pub const UPSTREAM_PASS: &str = "proxy-pass";

/// `Basic base64("proxy-user:proxy-pass")`
pub const EXPECTED_AUTHORIZATION: &str = "Basic cHJveHktdXNlcjpwcm94eS1wYXNz";

/// One request seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub collection: &'static str,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

/// Canned reply for one collection.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn records(records: serde_json::Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: serde_json::json!({ "Records": records }).to_string(),
        }
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<RecordedCall>>,
    replies: Mutex<HashMap<&'static str, Reply>>,
}

/// Programmable stand-in for the booking platform.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockUpstream {
    /// Start a mock on an ephemeral port. Collections reply with no records
    /// until told otherwise.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/api/spaces/coworkers", get(coworkers))
            .route("/api/spaces/bookings", get(bookings))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/spaces", self.addr)
    }

    pub fn reply_coworkers(&self, reply: Reply) {
        self.state.replies.lock().unwrap().insert("coworkers", reply);
    }

    pub fn reply_bookings(&self, reply: Reply) {
        self.state.replies.lock().unwrap().insert("bookings", reply);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, collection: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.collection == collection)
            .collect()
    }
}

async fn coworkers(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    respond(&state, "coworkers", &headers, query)
}

async fn bookings(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    respond(&state, "bookings", &headers, query)
}

fn respond(
    state: &MockState,
    collection: &'static str,
    headers: &HeaderMap,
    query: HashMap<String, String>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    state.calls.lock().unwrap().push(RecordedCall {
        collection,
        query,
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let reply = state
        .replies
        .lock()
        .unwrap()
        .get(collection)
        .cloned()
        .unwrap_or_else(|| Reply::records(serde_json::json!([])));

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
}

/// Configuration pointing at `upstream` with test credentials.
pub fn test_config(upstream: &MockUpstream) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = upstream.base_url();
    config.upstream.username = UPSTREAM_USER.into();
    config.upstream.password = SecretString::new(UPSTREAM_PASS.into());
    config.upstream.timeout_secs = 2;
    config.upstream.connect_timeout_secs = 1;
    config.signing.secret = SecretString::new(TEST_SECRET.into());
    config
}

/// A running proxy on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub client: reqwest::Client,
    gate: SignatureGate,
}

impl TestProxy {
    pub async fn start(config: ServiceConfig) -> Self {
        let gate = SignatureGate::new(config.signing.secret.clone());
        let server = HttpServer::new(config).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            server.run(listener, rx).await.unwrap();
        });

        Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
            gate,
        }
    }

    pub fn sign(&self, user_id: &str) -> String {
        self.gate.sign(user_id)
    }

    pub fn url(&self) -> String {
        format!("http://{}/api/get-bookings", self.addr)
    }

    /// GET the lookup endpoint with arbitrary query pairs.
    pub async fn get(&self, query: &[(&str, &str)]) -> reqwest::Response {
        self.client.get(self.url()).query(query).send().await.unwrap()
    }

    /// GET the lookup endpoint with a correct signature for `user_id`.
    pub async fn get_signed(&self, user_id: &str) -> reqwest::Response {
        let hash = self.sign(user_id);
        self.get(&[("userid", user_id), ("hash", hash.as_str())]).await
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
