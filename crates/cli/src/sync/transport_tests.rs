// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::transport::{classify_status, HttpTransport, SendFuture, Transport, TransportError, TransportResult};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tether_core::{NewOperation, QueuedOperation};
use yare::parameterized;

type SendHook = Box<dyn Fn(&QueuedOperation) + Send + Sync>;

#[derive(Default)]
struct MockState {
    /// Operations that were delivered successfully.
    delivered: Vec<QueuedOperation>,
    /// IDs of every send attempt, in order.
    attempts: Vec<String>,
    /// Results handed out before falling back to `default_result`.
    script: VecDeque<TransportResult<()>>,
    /// Result for sends once the script is exhausted (None = success).
    fail_with: Option<TransportError>,
    /// Artificial latency per send.
    delay: Option<Duration>,
    /// Called on every attempt, before the result is decided.
    on_send: Option<SendHook>,
}

/// Mock transport for testing without a backend.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send (after any scripted results) with `err`.
    pub fn fail_always(&self, err: TransportError) {
        self.state.lock().unwrap().fail_with = Some(err);
    }

    /// Go back to succeeding.
    pub fn succeed(&self) {
        self.state.lock().unwrap().fail_with = None;
    }

    /// Queue a result for the next send.
    pub fn push_result(&self, result: TransportResult<()>) {
        self.state.lock().unwrap().script.push_back(result);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn set_on_send(&self, hook: impl Fn(&QueuedOperation) + Send + Sync + 'static) {
        self.state.lock().unwrap().on_send = Some(Box::new(hook));
    }

    /// Operations delivered so far, in delivery order.
    pub fn delivered(&self) -> Vec<QueuedOperation> {
        self.state.lock().unwrap().delivered.clone()
    }

    /// Total number of send attempts.
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts.len()
    }

    /// Number of send attempts for one operation.
    pub fn attempts_for(&self, id: &str) -> usize {
        self.state.lock().unwrap().attempts.iter().filter(|a| a.as_str() == id).count()
    }
}

impl Transport for MockTransport {
    fn send<'a>(&'a self, op: &'a QueuedOperation) -> SendFuture<'a> {
        Box::pin(async move {
            let delay = self.state.lock().unwrap().delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut state = self.state.lock().unwrap();
            state.attempts.push(op.id.clone());
            if let Some(hook) = &state.on_send {
                hook(op);
            }

            let result = match state.script.pop_front() {
                Some(result) => result,
                None => match &state.fail_with {
                    Some(err) => Err(err.clone()),
                    None => Ok(()),
                },
            };
            if result.is_ok() {
                state.delivered.push(op.clone());
            }
            result
        })
    }
}

fn sample_op() -> QueuedOperation {
    QueuedOperation::new(NewOperation::chat_message("s-1", "hello"), chrono::Utc::now())
}

#[tokio::test]
async fn test_mock_transport_records_deliveries() {
    let transport = MockTransport::new();
    let op = sample_op();

    transport.send(&op).await.unwrap();

    assert_eq!(transport.attempts(), 1);
    assert_eq!(transport.delivered(), vec![op]);
}

#[tokio::test]
async fn test_mock_transport_script_then_fallback() {
    let transport = MockTransport::new();
    let op = sample_op();

    transport.push_result(Err(TransportError::Timeout));
    transport.fail_always(TransportError::Server(503));

    assert_eq!(transport.send(&op).await, Err(TransportError::Timeout));
    assert_eq!(transport.send(&op).await, Err(TransportError::Server(503)));

    transport.succeed();
    assert!(transport.send(&op).await.is_ok());
    assert_eq!(transport.attempts_for(&op.id), 3);
}

#[parameterized(
    ok = { 200, true },
    created = { 201, true },
    accepted = { 202, true },
)]
fn test_classify_success(status: u16, ok: bool) {
    assert_eq!(classify_status(status, "").is_ok(), ok);
}

#[parameterized(
    request_timeout = { 408 },
    too_many_requests = { 429 },
    internal_error = { 500 },
    bad_gateway = { 502 },
    unavailable = { 503 },
)]
fn test_classify_transient(status: u16) {
    let err = classify_status(status, "").unwrap_err();
    assert_eq!(err, TransportError::Server(status));
    assert!(!err.is_permanent());
}

#[parameterized(
    bad_request = { 400 },
    unauthorized = { 401 },
    forbidden = { 403 },
    not_found = { 404 },
    conflict = { 409 },
    unprocessable = { 422 },
)]
fn test_classify_permanent(status: u16) {
    let err = classify_status(status, "nope").unwrap_err();
    assert!(err.is_permanent());
    assert!(err.to_string().contains("nope"));
}

#[parameterized(
    unreachable = { TransportError::Unreachable("dns".into()), false },
    timeout = { TransportError::Timeout, false },
    server = { TransportError::Server(500), false },
    rejected = { TransportError::Rejected("bad".into()), true },
)]
fn test_is_permanent(err: TransportError, permanent: bool) {
    assert_eq!(err.is_permanent(), permanent);
}

#[test]
fn test_http_endpoint_strips_trailing_slash() {
    let transport = HttpTransport::new("http://localhost:8080/api/", Duration::from_secs(5)).unwrap();
    assert_eq!(transport.endpoint(), "http://localhost:8080/api/operations");
}

/// Serve a single HTTP request with the given status, returning the raw request.
async fn serve_once(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];

        // Read headers, then as much body as content-length says
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!("{}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n", status_line);
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        String::from_utf8_lossy(&raw).to_string()
    });

    (url, handle)
}

#[tokio::test]
async fn test_http_transport_posts_envelope_with_idempotency_key() {
    let (url, server) = serve_once("HTTP/1.1 201 Created").await;
    let transport = HttpTransport::new(&url, Duration::from_secs(5)).unwrap();
    let op = sample_op();

    transport.send(&op).await.unwrap();

    let request = server.await.unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /operations"));
    assert!(lower.contains(&format!("idempotency-key: {}", op.id)));
    assert!(request.contains("\"sessionId\":\"s-1\""));
}

#[tokio::test]
async fn test_http_transport_maps_client_error_to_rejection() {
    let (url, server) = serve_once("HTTP/1.1 422 Unprocessable Entity").await;
    let transport = HttpTransport::new(&url, Duration::from_secs(5)).unwrap();

    let err = transport.send(&sample_op()).await.unwrap_err();
    server.await.unwrap();

    assert!(err.is_permanent());
}

#[tokio::test]
async fn test_http_transport_unreachable_is_transient() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
    let err = transport.send(&sample_op()).await.unwrap_err();

    assert!(matches!(err, TransportError::Unreachable(_) | TransportError::Timeout));
    assert!(!err.is_permanent());
}
