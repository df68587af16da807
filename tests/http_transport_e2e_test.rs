//! reqwest transport against a local HTTP responder.

mod support;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use memory_match::adapter::{
    ApiResponse, AuthHeader, HttpTransport, MemoryStore, RemoteServices, ServiceConfig,
    SubmitOutcome, Transport, TransportError,
};
use memory_match::types::DisplayRank;
use support::init_logging;

#[derive(Debug, Clone)]
struct CapturedRequest {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: String,
}

/// Answer one request per scripted `(status, body)`, then stop.
async fn serve(script: Vec<(u16, &'static str)>) -> (SocketAddr, JoinHandle<Vec<CapturedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let task = tokio::spawn(async move {
        let mut captured = Vec::new();
        for (status, body) in script {
            let (stream, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = stream.into_split();
            let mut reader = BufReader::new(read_half);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).await.unwrap();
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let path = parts.next().unwrap_or_default().to_string();

            let mut headers = HashMap::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
            }

            let len: usize = headers
                .get("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).await.unwrap();

            captured.push(CapturedRequest {
                method,
                path,
                headers,
                body: String::from_utf8(buf).unwrap(),
            });

            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            write_half.write_all(response.as_bytes()).await.unwrap();
            write_half.shutdown().await.unwrap();
        }
        captured
    });

    (addr, task)
}

fn config_for(addr: SocketAddr) -> ServiceConfig {
    ServiceConfig {
        base_url: format!("http://{addr}/api/"),
        timeout: Duration::from_secs(5),
        leaderboard_size: 10,
        leaderboard_endpoints: memory_match::adapter::config::default_leaderboard_endpoints(10),
        data_dir: std::env::temp_dir(),
        ..ServiceConfig::default()
    }
}

#[tokio::test]
async fn test_submit_wire_format_and_raw_retry() {
    init_logging();
    let (addr, server) = serve(vec![
        (401, r#"{"code":401,"message":"Unauthorized"}"#),
        (200, r#"{"code":200,"message":"ok"}"#),
    ])
    .await;

    let config = config_for(addr);
    let transport = Arc::new(HttpTransport::new(&config).unwrap());
    let services =
        RemoteServices::with_parts(&config, Arc::new(MemoryStore::new()), transport);
    services.session.sign_in("alice", "tok-123").unwrap();

    let outcome = services.coordinator.submit(47).await;
    assert_eq!(outcome, SubmitOutcome::Accepted { retried_raw: true });

    let requests = server.await.unwrap();
    assert_eq!(requests.len(), 2);

    let first = &requests[0];
    assert_eq!(first.method, "POST");
    assert_eq!(first.path, "/api/Scores/submit");
    assert_eq!(first.headers["authorization"], "Bearer tok-123");
    assert!(first.headers["content-type"].starts_with("application/json"));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&first.body).unwrap(),
        json!({ "completionTimeSeconds": 47 })
    );

    assert_eq!(requests[1].headers["authorization"], "tok-123");
}

#[tokio::test]
async fn test_leaderboard_over_http() {
    init_logging();
    let (addr, server) = serve(vec![
        (404, ""),
        (
            200,
            r#"{"code":200,"message":"ok","data":{"items":[
                {"username":"a","completeTimeSeconds":30,"completeAt":"t1"},
                {"username":"b","completeTimeSeconds":40,"completeAt":"t2"},
                {"username":"c","completeTimeSeconds":60,"completeAt":"t3"},
                {"username":"d","completeTimeSeconds":70,"completeAt":"t4"}
            ]}}"#,
        ),
    ])
    .await;

    let config = config_for(addr);
    let transport = Arc::new(HttpTransport::new(&config).unwrap());
    let services =
        RemoteServices::with_parts(&config, Arc::new(MemoryStore::new()), transport);
    services.session.sign_in("me", "tok").unwrap();
    services.records.record_completion("me", 50).unwrap();

    let reconciliation = services.reconciler.reconcile_stored().await;
    assert_eq!(reconciliation.rank, Some(DisplayRank::Estimated(3)));
    assert_eq!(reconciliation.entries.len(), 4);

    let requests = server.await.unwrap();
    assert_eq!(requests[0].path, "/api/Score/leaderboard?page=1&size=10");
    assert_eq!(requests[1].path, "/api/score/leaderboard?page=1&size=10");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].headers["authorization"], "Bearer tok");
}

#[tokio::test]
async fn test_error_status_and_empty_body() {
    let (addr, server) = serve(vec![(500, ""), (201, "")]).await;
    let transport = HttpTransport::new(&config_for(addr)).unwrap();

    let header = AuthHeader::from_token("t");
    let failed = transport.get("anything", header.as_ref()).await;
    assert_eq!(
        failed,
        ApiResponse::Error {
            code: 500,
            message: "HTTP Error 500".to_string()
        }
    );

    let created = transport.post("anything", &json!({}), None).await;
    assert_eq!(created, ApiResponse::Success(serde_json::Value::Null));
    server.await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(&config_for(addr)).unwrap();
    match transport.get("Score/leaderboard", None).await {
        ApiResponse::Exception(err) => assert!(err.is_transient(), "{err:?}"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept and never answer.
    let _server = tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let config = ServiceConfig {
        timeout: Duration::from_millis(200),
        ..config_for(addr)
    };
    let transport = HttpTransport::new(&config).unwrap();
    assert_eq!(
        transport.get("slow", None).await,
        ApiResponse::Exception(TransportError::Timeout)
    );
}
