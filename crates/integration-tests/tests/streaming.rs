mod harness;

use futures_util::StreamExt;
use harness::config::ConfigBuilder;
use harness::mock_ollama::{MockOllama, StreamEnd};
use harness::server::TestServer;
use serde_json::{Value, json};

fn streaming_body() -> Value {
    json!({
        "model": "llama3",
        "messages": [{"role": "user", "content": "Hello"}],
        "stream": true
    })
}

/// Parse SSE event lines from raw response text
fn parse_sse_data(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(ToOwned::to_owned)
        .collect()
}

async fn stream_events(mock: &MockOllama) -> (TestServer, Vec<String>) {
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&streaming_body())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let text = resp.text().await.unwrap();
    (server, parse_sse_data(&text))
}

#[tokio::test]
async fn streaming_returns_sse_content_type() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&streaming_body())
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.contains("text/event-stream"),
        "expected text/event-stream, got {content_type}"
    );
    assert_eq!(resp.headers()["cache-control"], "no-cache");
}

#[tokio::test]
async fn streaming_emits_chunks_then_done() {
    let mock = MockOllama::start().await.unwrap();
    let (server, events) = stream_events(&mock).await;

    assert_eq!(events.len(), 3, "events: {events:?}");

    let first: Value = serde_json::from_str(&events[0]).unwrap();
    let second: Value = serde_json::from_str(&events[1]).unwrap();

    assert_eq!(first["object"], "chat.completion.chunk");
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["created"], second["created"]);
    assert_eq!(first["choices"][0]["delta"]["content"], "Hi");
    assert_eq!(first["choices"][0]["finish_reason"], "");
    assert_eq!(second["choices"][0]["delta"]["content"], " there");
    assert_eq!(second["choices"][0]["finish_reason"], "stop");
    assert_eq!(events[2], "[DONE]");

    assert_eq!(mock.last_chat()["stream"], true);

    // "Hi there" as a whole, not per fragment
    let usage = server.usage().await;
    assert_eq!(usage["unknown"]["completion_tokens"], 3);
    assert_eq!(usage["unknown"]["total_requests"], 1);
}

#[tokio::test]
async fn stream_without_done_still_terminates() {
    let mock = MockOllama::start_with(&["partial"], StreamEnd::Eof).await.unwrap();
    let (_server, events) = stream_events(&mock).await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[1], "[DONE]");
}

#[tokio::test]
async fn malformed_unit_ends_stream_without_done() {
    let mock = MockOllama::start_with(&["Hello"], StreamEnd::Malformed).await.unwrap();
    let (server, events) = stream_events(&mock).await;

    assert_eq!(events.len(), 1);
    let chunk: Value = serde_json::from_str(&events[0]).unwrap();
    assert_eq!(chunk["choices"][0]["delta"]["content"], "Hello");

    assert_eq!(server.usage().await["unknown"]["total_requests"], 1);
}

#[tokio::test]
async fn in_band_error_ends_stream_without_done() {
    let mock = MockOllama::start_with(&["Hello"], StreamEnd::InBandError).await.unwrap();
    let (_server, events) = stream_events(&mock).await;

    assert_eq!(events.len(), 1);
    assert!(!events.iter().any(|event| event == "[DONE]"));
}

#[tokio::test]
async fn client_disconnect_closes_backend_stream() {
    let mock = MockOllama::start_with(&["Hello", " world"], StreamEnd::Hang).await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&streaming_body())
        .send()
        .await
        .unwrap();

    let mut body = resp.bytes_stream();
    let mut received = String::new();
    while !received.contains(" world") {
        let bytes = body.next().await.unwrap().unwrap();
        received.push_str(&String::from_utf8_lossy(&bytes));
    }
    drop(body);

    assert!(mock.wait_for_stream_closed().await, "backend stream was never released");
    assert!(!received.contains("[DONE]"));

    // Partial usage is recorded once the session is torn down
    let mut recorded = Value::Null;
    for _ in 0..50 {
        recorded = server.usage().await["unknown"].clone();
        if !recorded.is_null() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(recorded["total_requests"], 1);
}

#[tokio::test]
async fn stalled_stream_hits_deadline() {
    let mock = MockOllama::start_with(&["Hello"], StreamEnd::Hang).await.unwrap();
    let config = ConfigBuilder::new(&mock.url()).with_timeout(1).build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/chat/completions"))
        .json(&streaming_body())
        .send()
        .await
        .unwrap();

    let text = tokio::time::timeout(std::time::Duration::from_secs(10), resp.text())
        .await
        .expect("stream was not ended by the deadline")
        .unwrap();
    let events = parse_sse_data(&text);

    assert_eq!(events.len(), 1);
    assert!(mock.wait_for_stream_closed().await);
}

#[tokio::test]
async fn responses_api_can_stream() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/responses"))
        .json(&json!({"input": "Hello", "stream": true}))
        .send()
        .await
        .unwrap();

    let events = parse_sse_data(&resp.text().await.unwrap());

    assert_eq!(events.len(), 3);
    assert_eq!(events[2], "[DONE]");
}
