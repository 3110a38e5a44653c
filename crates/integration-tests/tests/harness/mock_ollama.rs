//! Mock Ollama server for integration tests
//!
//! Serves `/api/chat` (single JSON or NDJSON stream), `/api/embed` and
//! `/api/tags` with canned replies.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures_util::{StreamExt, stream};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// How a streamed chat reply ends after its fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The last fragment carries `done: true`
    Done,
    /// The body closes without a `done` unit
    Eof,
    /// A line that is not JSON follows the fragments
    Malformed,
    /// An in-band `{"error": ...}` unit follows the fragments
    InBandError,
    /// The body stays open without sending anything else
    Hang,
}

/// Mock Ollama backend returning predictable replies
pub struct MockOllama {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    fragments: Vec<String>,
    end: StreamEnd,
    chat_count: AtomicU32,
    embed_count: AtomicU32,
    tags_count: AtomicU32,
    last_chat: Mutex<Option<Value>>,
    /// Set when a streamed body is dropped by the gateway
    stream_closed: Arc<AtomicBool>,
}

impl MockOllama {
    /// Start a mock replying `Hi there` in two fragments
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(&["Hi", " there"], StreamEnd::Done).await
    }

    pub async fn start_with(fragments: &[&str], end: StreamEnd) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            fragments: fragments.iter().map(|&fragment| fragment.to_owned()).collect(),
            end,
            chat_count: AtomicU32::new(0),
            embed_count: AtomicU32::new(0),
            tags_count: AtomicU32::new(0),
            last_chat: Mutex::new(None),
            stream_closed: Arc::new(AtomicBool::new(false)),
        });

        let app = Router::new()
            .route("/api/chat", routing::post(handle_chat))
            .route("/api/embed", routing::post(handle_embed))
            .route("/api/tags", routing::get(handle_tags))
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

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn chat_count(&self) -> u32 {
        self.state.chat_count.load(Ordering::Relaxed)
    }

    pub fn embed_count(&self) -> u32 {
        self.state.embed_count.load(Ordering::Relaxed)
    }

    pub fn tags_count(&self) -> u32 {
        self.state.tags_count.load(Ordering::Relaxed)
    }

    /// Body of the most recent `/api/chat` request
    pub fn last_chat(&self) -> Value {
        self.state
            .last_chat
            .lock()
            .unwrap()
            .clone()
            .expect("no chat request received")
    }

    /// Wait until the gateway has dropped a streamed body
    pub async fn wait_for_stream_closed(&self) -> bool {
        tokio::time::timeout(Duration::from_secs(20), async {
            while !self.state.stream_closed.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .is_ok()
    }
}

impl Drop for MockOllama {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn unit(model: &str, content: &str, done: bool) -> Value {
    json!({
        "model": model,
        "created_at": "2024-05-01T10:00:00Z",
        "message": {"role": "assistant", "content": content},
        "done": done,
    })
}

fn ndjson_line(value: &Value) -> Bytes {
    Bytes::from(format!("{value}\n"))
}

struct CloseFlag(Arc<AtomicBool>);

impl Drop for CloseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

async fn handle_chat(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.chat_count.fetch_add(1, Ordering::Relaxed);
    *state.last_chat.lock().unwrap() = Some(body.clone());

    let model = body["model"].as_str().unwrap_or_default().to_owned();

    if model == "missing" {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "model 'missing' not found"}))).into_response();
    }

    if !body["stream"].as_bool().unwrap_or(true) {
        if state.end == StreamEnd::Hang {
            std::future::pending::<()>().await;
        }
        return Json(unit(&model, &state.fragments.concat(), true)).into_response();
    }

    let last = state.fragments.len().saturating_sub(1);
    let mut lines: Vec<Bytes> = state
        .fragments
        .iter()
        .enumerate()
        .map(|(i, fragment)| ndjson_line(&unit(&model, fragment, state.end == StreamEnd::Done && i == last)))
        .collect();

    match state.end {
        StreamEnd::Malformed => lines.push(Bytes::from_static(b"{not json\n")),
        StreamEnd::InBandError => lines.push(ndjson_line(&json!({"error": "model crashed"}))),
        StreamEnd::Done | StreamEnd::Eof | StreamEnd::Hang => {}
    }

    let hang = state.end == StreamEnd::Hang;
    let flag = CloseFlag(Arc::clone(&state.stream_closed));

    let body = stream::iter(lines)
        .chain(stream::iter(hang.then_some(())).flat_map(|()| stream::pending()))
        .map(move |line| {
            let _flag = &flag;
            Ok::<_, Infallible>(line)
        });

    ([("content-type", "application/x-ndjson")], Body::from_stream(body)).into_response()
}

async fn handle_embed(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.embed_count.fetch_add(1, Ordering::Relaxed);

    let input = body["input"].as_str().unwrap_or_default();

    if input == "fail" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "embedding failed"}))).into_response();
    }

    #[allow(clippy::cast_precision_loss)]
    let marker = input.len() as f64;

    Json(json!({
        "model": body["model"],
        "embeddings": [[marker, 0.5, -0.5]],
    }))
    .into_response()
}

async fn handle_tags(State(state): State<Arc<MockState>>) -> Response {
    state.tags_count.fetch_add(1, Ordering::Relaxed);

    Json(json!({
        "models": [
            {
                "name": "llama3:latest",
                "model": "llama3:latest",
                "modified_at": "2024-05-01T10:00:00Z",
                "size": 4_661_224_676_u64,
                "digest": "365c0bd3c000",
                "details": {"format": "gguf", "family": "llama", "parameter_size": "8B", "quantization_level": "Q4_0"}
            },
            {
                "name": "library/nomic-embed-text:v1.5",
                "model": "library/nomic-embed-text:v1.5",
                "modified_at": "not a timestamp",
                "size": 274_302_450_u64,
                "digest": "0a109f422b47"
            }
        ]
    }))
    .into_response()
}
