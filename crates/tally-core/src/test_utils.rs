//! Test utilities for tally-core
//!
//! A mock model server speaking both the Ollama and the OpenAI
//! chat-completions wire formats, replying with a canned completion.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

struct ServerState {
    /// Completion text to return; `None` makes every endpoint answer 500
    reply: Option<String>,
    requests: Mutex<Vec<Value>>,
}

type SharedState = Arc<ServerState>;

/// Mock model server for tests and local development
pub struct MockModelServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockModelServer {
    /// Start a server that answers every completion with `reply`
    pub async fn start(reply: &str) -> Self {
        Self::spawn(Some(reply.to_string())).await
    }

    /// Start a server whose endpoints all fail with 500
    pub async fn failing() -> Self {
        Self::spawn(None).await
    }

    async fn spawn(reply: Option<String>) -> Self {
        let state = Arc::new(ServerState {
            reply,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request bodies received on the completion endpoints, oldest first
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockModelServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn unavailable() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded").into_response()
}

async fn handle_tags(State(state): State<SharedState>) -> Response {
    if state.reply.is_none() {
        return unavailable();
    }
    Json(json!({ "models": [{ "name": "llama3.2:latest" }] })).into_response()
}

async fn handle_models(State(state): State<SharedState>) -> Response {
    if state.reply.is_none() {
        return unavailable();
    }
    Json(json!({ "object": "list", "data": [{ "id": "test-model", "object": "model" }] }))
        .into_response()
}

/// Ollama generate endpoint
async fn handle_generate(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let model = body["model"].clone();
    state.requests.lock().unwrap().push(body);

    match state.reply {
        Some(ref reply) => Json(json!({
            "model": model,
            "response": reply,
            "done": true,
        }))
        .into_response(),
        None => unavailable(),
    }
}

/// OpenAI chat completions endpoint
async fn handle_chat(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let model = body["model"].clone();
    state.requests.lock().unwrap().push(body);

    match state.reply {
        Some(ref reply) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": reply },
                "finish_reason": "stop",
            }],
        }))
        .into_response(),
        None => unavailable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_generate() {
        let server = MockModelServer::start("hello").await;
        let client = reqwest::Client::new();

        let resp: Value = client
            .post(format!("{}/api/generate", server.url()))
            .json(&json!({ "model": "llama3.2", "prompt": "hi", "stream": false }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(resp["response"], "hello");
        assert_eq!(server.requests().len(), 1);
        assert_eq!(server.requests()[0]["prompt"], "hi");
    }

    #[tokio::test]
    async fn test_mock_server_chat() {
        let server = MockModelServer::start("hello").await;
        let client = reqwest::Client::new();

        let resp: Value = client
            .post(format!("{}/v1/chat/completions", server.url()))
            .json(&json!({ "model": "m", "messages": [] }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(resp["choices"][0]["message"]["content"], "hello");
    }

    #[tokio::test]
    async fn test_failing_server() {
        let server = MockModelServer::failing().await;
        let resp = reqwest::get(format!("{}/api/tags", server.url()))
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
    }
}
