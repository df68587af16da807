//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Once};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use memory_match::adapter::{
    ApiResponse, AuthHeader, MemoryStore, RemoteServices, ServiceConfig, Transport, TransportError,
};
use memory_match::types::Tile;

static INIT_LOGGING: Once = Once::new();

/// Quiet by default; `TEST_LOG` (or `RUST_LOG`) turns logs on.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// Unshuffled board: positions `i` and `i + pairs` share a ref.
pub fn ordered_board(pairs: usize) -> Vec<Tile> {
    (0..pairs * 2)
        .map(|i| Tile::new(i as u32, format!("ref-{}", i % pairs)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub endpoint: String,
    pub body: Option<Value>,
    pub authorization: Option<String>,
}

/// Transport answering from a script, one response per call in order.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<ApiResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(responses: impl IntoIterator<Item = ApiResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn answer(&self, call: RecordedCall) -> ApiResponse {
        self.calls.lock().push(call);
        self.responses.lock().pop_front().unwrap_or_else(|| {
            ApiResponse::Exception(TransportError::Network("script exhausted".to_string()))
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, endpoint: &str, body: &Value, auth: Option<&AuthHeader>) -> ApiResponse {
        self.answer(RecordedCall {
            method: "POST",
            endpoint: endpoint.to_string(),
            body: Some(body.clone()),
            authorization: auth.map(AuthHeader::header_value),
        })
    }

    async fn get(&self, endpoint: &str, auth: Option<&AuthHeader>) -> ApiResponse {
        self.answer(RecordedCall {
            method: "GET",
            endpoint: endpoint.to_string(),
            body: None,
            authorization: auth.map(AuthHeader::header_value),
        })
    }
}

pub fn not_found() -> ApiResponse {
    ApiResponse::Error {
        code: 404,
        message: "Not Found".to_string(),
    }
}

pub fn leaderboard_body(rows: &[(&str, u32)]) -> ApiResponse {
    let items: Vec<Value> = rows
        .iter()
        .map(|(user, secs)| {
            serde_json::json!({
                "username": user,
                "completeTimeSeconds": secs,
                "completeAt": "2024-05-01T10:00:00Z",
            })
        })
        .collect();
    ApiResponse::Success(serde_json::json!({
        "code": 200,
        "message": "ok",
        "data": { "items": items },
    }))
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        base_url: "http://127.0.0.1:9/api/".to_string(),
        data_dir: std::env::temp_dir(),
        ..ServiceConfig::default()
    }
}

/// Services over an in-memory store; signed in as `username` when given.
pub fn services_with(
    transport: Arc<ScriptedTransport>,
    username: Option<&str>,
) -> (RemoteServices, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let services = RemoteServices::with_parts(&test_config(), store.clone(), transport);
    if let Some(username) = username {
        services
            .session
            .sign_in(username, "header.payload.sig")
            .unwrap();
    }
    (services, store)
}
