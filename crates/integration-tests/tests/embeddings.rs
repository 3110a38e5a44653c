mod harness;

use harness::config::ConfigBuilder;
use harness::mock_ollama::MockOllama;
use harness::server::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn embeddings_preserve_input_order() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/embeddings"))
        .json(&json!({"input": ["a", "bbb"]}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["object"], "list");
    assert_eq!(body["model"], "nomic-embed-text");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["object"], "embedding");
    assert_eq!(body["data"][0]["index"], 0);
    assert_eq!(body["data"][0]["embedding"][0], 1.0);
    assert_eq!(body["data"][1]["index"], 1);
    assert_eq!(body["data"][1]["embedding"][0], 3.0);
    assert_eq!(body["usage"]["prompt_tokens"], 2);
    assert_eq!(body["usage"]["total_tokens"], 2);
    assert_eq!(mock.embed_count(), 2);

    let usage = server.usage().await;
    assert_eq!(usage["unknown"]["embedding_tokens"], 2);
    assert_eq!(usage["unknown"]["embedding_requests"], 1);
}

#[tokio::test]
async fn single_string_input_is_accepted() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/embeddings"))
        .json(&json!({"model": "mxbai-embed-large", "input": "hello world"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["model"], "mxbai-embed-large");
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failing_item_fails_whole_request() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/embeddings"))
        .json(&json!({"input": ["ok", "fail", "never"]}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["type"], "server_error");
    assert_eq!(mock.embed_count(), 2);
    assert_eq!(server.usage().await, json!({}));
}

#[tokio::test]
async fn missing_input_is_bad_request() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/embeddings"))
        .json(&json!({"model": "nomic-embed-text"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(mock.embed_count(), 0);
}
