#![allow(dead_code)]

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};

/// What the fake webhook saw, and what it answers with.
pub struct Received {
    status: AtomicU16,
    pub requests: Mutex<Vec<(Option<String>, serde_json::Value)>>,
}

impl Received {
    pub fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> (Option<String>, serde_json::Value) {
        self.requests.lock().unwrap().last().cloned().expect("no request received")
    }
}

async fn hook(
    State(received): State<Arc<Received>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    received.requests.lock().unwrap().push((content_type, body));
    StatusCode::from_u16(received.status.load(Ordering::SeqCst)).unwrap()
}

/// Start a webhook on an ephemeral port, returns its url.
pub async fn spawn_webhook(status: StatusCode) -> (String, Arc<Received>) {
    let received = Arc::new(Received {
        status: AtomicU16::new(status.as_u16()),
        requests: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/webhook/lead", post(hook))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/webhook/lead", addr), received)
}
