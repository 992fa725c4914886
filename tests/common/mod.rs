//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;

use social_gateway::config::{GatewayConfig, UpstreamTarget};
use social_gateway::gateway::OperationRegistry;
use social_gateway::upstream::UpstreamClient;
use social_gateway::HttpServer;

/// A request seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Responder = dyn Fn(&Captured) -> (u16, String) + Send + Sync;

#[derive(Clone)]
struct MockState {
    seen: Arc<Mutex<Vec<Captured>>>,
    respond: Arc<Responder>,
}

/// Handle to a running mock upstream.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.seen
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("mock upstream received no requests")
    }
}

/// Start a mock upstream that answers every request with `f(request)`.
pub async fn start_programmable_upstream<F>(f: F) -> MockUpstream
where
    F: Fn(&Captured) -> (u16, String) + Send + Sync + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        seen: seen.clone(),
        respond: Arc::new(f),
    };

    let app = Router::new().fallback(record).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, seen }
}

/// Start a mock upstream that always answers with `status` and `body`.
pub async fn start_mock_upstream(status: u16, body: &'static str) -> MockUpstream {
    start_programmable_upstream(move |_| (status, body.to_string())).await
}

async fn record(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let captured = Captured {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    };
    let (status, body) = (state.respond)(&captured);
    state.seen.lock().unwrap().push(captured);
    (StatusCode::from_u16(status).unwrap(), body)
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config with every operation pointed at `base/<operation name>`.
pub fn config_for(base: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.timeouts.connect_secs = 2;
    config.timeouts.upstream_secs = 5;
    for operation in OperationRegistry::builtin().iter() {
        config.upstreams.insert(
            operation.name.to_string(),
            UpstreamTarget::new(format!("{}/{}", base.trim_end_matches('/'), operation.name)),
        );
    }
    config
}

/// Plain reqwest client that ignores proxy environment variables.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Gateway server whose upstream calls bypass any system proxy.
pub fn server_for(config: GatewayConfig) -> HttpServer {
    HttpServer::with_client(config, UpstreamClient::from_client(direct_client())).unwrap()
}
