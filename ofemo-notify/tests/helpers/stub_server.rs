//! Local HTTP stub standing in for the site handlers and the EmailJS API
//!
//! Binds 127.0.0.1 on an ephemeral port, answers every request with one
//! scripted reply and records the path and body of each request.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted response
#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl StubReply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// `200 {"success":true}`
    pub fn handler_ok() -> Self {
        Self::new(StatusCode::OK, r#"{"success":true}"#)
    }

    /// `200 OK` as EmailJS answers
    pub fn emailjs_ok() -> Self {
        Self::new(StatusCode::OK, "OK")
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct StubState {
    reply: StubReply,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubServer {
    /// `(path, body)` of every request received
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

async fn record(State(state): State<StubState>, uri: Uri, body: String) -> (StatusCode, String) {
    state
        .requests
        .lock()
        .unwrap()
        .push((uri.path().to_string(), body));
    if !state.reply.delay.is_zero() {
        tokio::time::sleep(state.reply.delay).await;
    }
    (state.reply.status, state.reply.body.clone())
}

pub async fn spawn_stub(reply: StubReply) -> StubServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        reply,
        requests: requests.clone(),
    };
    let app = Router::new().fallback(record).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StubServer {
        base_url: format!("http://{}", addr),
        requests,
    }
}

/// Base URL of a port nothing is listening on
pub async fn unused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
