//! Credential strategies against real HTTP endpoints.
//!
//! Each test starts an axum server on an ephemeral port that stands in for
//! the issuance endpoint (or the sandbox token server) and records what it
//! received.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use roomkey_sdk::config::{AppConfig, DeploymentMode};
use roomkey_sdk::details::{ConnectionDetails, ConnectionDetailsStore};
use roomkey_sdk::error::CredentialError;
use roomkey_sdk::source::TokenSource;
use roomkey_sdk::strategy::{StrategyKind, select_strategy};

#[derive(Debug, Clone)]
struct Recorded {
    content_type: Option<String>,
    sandbox_id: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct Mock {
    requests: Arc<Mutex<Vec<Recorded>>>,
    status: StatusCode,
    body: &'static str,
}

async fn respond(State(mock): State<Mock>, headers: HeaderMap, body: String) -> impl IntoResponse {
    let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    mock.requests.lock().push(Recorded {
        content_type: header_str("content-type"),
        sandbox_id: header_str("x-sandbox-id"),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });
    (mock.status, [(header::CONTENT_TYPE, "application/json")], mock.body)
}

/// Serve `body` with `status` on both the issuance and sandbox paths.
async fn start_mock(status: StatusCode, body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<Recorded>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let mock = Mock {
        requests: requests.clone(),
        status,
        body,
    };
    let app = Router::new()
        .route("/api/connection-details", post(respond))
        .route("/sandbox/connection-details", post(respond))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, requests)
}

/// Answer every connection with `status_line` over plain HTTP/1.1, so the
/// reason phrase can be anything the server likes.
async fn start_raw(status_line: &'static str) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}"
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Consume headers and a Content-Length body.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return;
        }
    }
}

fn backend_config(addr: SocketAddr) -> AppConfig {
    AppConfig::default().with_base_url(format!("http://{addr}"))
}

fn ada() -> ConnectionDetails {
    ConnectionDetails::new("Ada", "ada@example.com", "p-42")
}

#[tokio::test]
async fn success_returns_body_verbatim() {
    let (addr, requests) = start_mock(StatusCode::OK, r#"{"token":"abc","url":"wss://x"}"#).await;
    let strategy = select_strategy(&backend_config(addr), &DeploymentMode::Backend);

    let credential = strategy.fetch(&ada()).await.unwrap();
    assert_eq!(credential.as_value(), &json!({"token": "abc", "url": "wss://x"}));

    let requests = requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        requests[0].body,
        json!({"initial_query": "p-42", "user_name": "Ada", "user_email": "ada@example.com"})
    );
}

#[tokio::test]
async fn server_error_carries_status_text_and_is_not_retried() {
    let (addr, requests) = start_mock(StatusCode::INTERNAL_SERVER_ERROR, "{}").await;
    let strategy = select_strategy(&backend_config(addr), &DeploymentMode::Backend);

    let err = strategy.fetch(&ada()).await.unwrap_err();
    assert!(err.to_string().contains("Internal Server Error"), "got: {err}");
    assert!(matches!(err, CredentialError::RequestFailed { status: 500, .. }));
    assert_eq!(requests.lock().len(), 1);
}

#[tokio::test]
async fn custom_reason_phrase_is_kept() {
    let addr = start_raw("HTTP/1.1 500 Token Service Overloaded").await;
    let strategy = select_strategy(&backend_config(addr), &DeploymentMode::Backend);

    let err = strategy.fetch(&ada()).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch token: Token Service Overloaded");
    assert!(matches!(
        err,
        CredentialError::RequestFailed { status: 500, ref status_text } if status_text == "Token Service Overloaded"
    ));
}

#[tokio::test]
async fn sandbox_keeps_custom_reason_phrase() {
    let addr = start_raw("HTTP/1.1 429 Sandbox Quota Exceeded").await;
    let mode = DeploymentMode::from_var(Some(format!("http://{addr}/sandbox/connection-details")));
    let err = select_strategy(&AppConfig::default(), &mode)
        .fetch(&ConnectionDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::Sandbox(ref m) if m == "Sandbox Quota Exceeded"));
}

#[tokio::test]
async fn unparseable_base_url_is_not_retryable() {
    let config = AppConfig::default().with_base_url("not a url");
    let err = select_strategy(&config, &DeploymentMode::Backend)
        .fetch(&ada())
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::Transport(ref e) if e.is_builder()));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn non_json_body_is_a_parse_failure() {
    let (addr, _) = start_mock(StatusCode::OK, "<html>oops</html>").await;
    let strategy = select_strategy(&backend_config(addr), &DeploymentMode::Backend);

    let err = strategy.fetch(&ada()).await.unwrap_err();
    assert!(matches!(err, CredentialError::ParseFailed(_)));
}

#[tokio::test]
async fn agent_name_controls_room_config() {
    let (addr, requests) = start_mock(StatusCode::OK, "{}").await;

    let with_agent = select_strategy(&backend_config(addr).with_agent("concierge"), &DeploymentMode::Backend);
    with_agent.fetch(&ada()).await.unwrap();

    let mut empty_agent = backend_config(addr);
    empty_agent.agent_name = Some(String::new());
    select_strategy(&empty_agent, &DeploymentMode::Backend)
        .fetch(&ada())
        .await
        .unwrap();

    let requests = requests.lock();
    assert_eq!(requests[0].body["room_config"]["agents"][0]["agent_name"], "concierge");
    assert_eq!(requests[0].body["room_config"]["agents"].as_array().map(Vec::len), Some(1));
    assert!(requests[1].body.get("room_config").is_none());
}

#[tokio::test]
async fn empty_details_are_sent_unvalidated() {
    let (addr, requests) = start_mock(StatusCode::OK, "{}").await;
    let strategy = select_strategy(&backend_config(addr), &DeploymentMode::Backend);
    strategy.fetch(&ConnectionDetails::default()).await.unwrap();
    assert_eq!(
        requests.lock()[0].body,
        json!({"initial_query": "", "user_name": "", "user_email": ""})
    );
}

#[tokio::test]
async fn source_sees_latest_product_between_calls() {
    let (addr, requests) = start_mock(StatusCode::OK, "{}").await;
    let store = ConnectionDetailsStore::new(ada());
    let source = TokenSource::new(
        select_strategy(&backend_config(addr), &DeploymentMode::Backend),
        store.clone(),
    );

    source.resolve().await.unwrap();
    store.replace(store.current().with_product("p-99"));
    source.resolve().await.unwrap();

    let requests = requests.lock();
    assert_eq!(requests[0].body["initial_query"], "p-42");
    assert_eq!(requests[1].body["initial_query"], "p-99");
    assert_eq!(requests[1].body["user_name"], "Ada");
}

#[tokio::test]
async fn concurrent_calls_are_not_coalesced() {
    let (addr, requests) = start_mock(StatusCode::OK, "{}").await;
    let source = TokenSource::new(
        select_strategy(&backend_config(addr), &DeploymentMode::Backend),
        ConnectionDetailsStore::new(ada()),
    );

    let (a, b, c) = tokio::join!(source.resolve(), source.resolve(), source.resolve());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(requests.lock().len(), 3);
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let strategy = select_strategy(&backend_config(addr), &DeploymentMode::Backend);
    let err = strategy.fetch(&ada()).await.unwrap_err();
    assert!(matches!(err, CredentialError::Transport(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn sandbox_server_gets_config_not_details() {
    let (addr, requests) = start_mock(StatusCode::OK, r#"{"participantToken":"sbx"}"#).await;
    let mode = DeploymentMode::from_var(Some(format!("http://{addr}/sandbox/connection-details")));
    let config = AppConfig {
        sandbox_id: Some("demo-sandbox".into()),
        ..AppConfig::default().with_agent("concierge")
    };

    let strategy = select_strategy(&config, &mode);
    assert_eq!(strategy.kind(), StrategyKind::Sandbox);
    let credential = strategy.fetch(&ada()).await.unwrap();
    assert_eq!(credential.participant_token(), Some("sbx"));

    let requests = requests.lock();
    assert_eq!(requests[0].sandbox_id.as_deref(), Some("demo-sandbox"));
    assert_eq!(
        requests[0].body,
        json!({"room_config": {"agents": [{"agent_name": "concierge"}]}})
    );
}

#[tokio::test]
async fn sandbox_failure_is_reported_as_sandbox_error() {
    let (addr, _) = start_mock(StatusCode::SERVICE_UNAVAILABLE, "{}").await;
    let mode = DeploymentMode::from_var(Some(format!("http://{addr}/sandbox/connection-details")));
    let err = select_strategy(&AppConfig::default(), &mode)
        .fetch(&ConnectionDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::Sandbox(ref m) if m == "Service Unavailable"));
}
