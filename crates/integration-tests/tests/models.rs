mod harness;

use harness::config::ConfigBuilder;
use harness::mock_ollama::MockOllama;
use harness::server::TestServer;
use serde_json::Value;

#[tokio::test]
async fn models_are_listed_in_openai_shape() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server.client().get(server.url("/v1/models")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert_eq!(body["object"], "list");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"], "llama3:latest");
    assert_eq!(data[0]["object"], "model");
    assert_eq!(data[0]["owned_by"], "ollama");
    // 2024-05-01T10:00:00Z
    assert_eq!(data[0]["created"], 1_714_557_600);
    // Unparseable timestamps fall back to the current time
    assert!(data[1]["created"].as_i64().unwrap() > 1_714_557_600);
}

#[tokio::test]
async fn single_model_lookup_supports_namespaced_names() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .get(server.url("/v1/models/library/nomic-embed-text:v1.5"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "library/nomic-embed-text:v1.5");
}

#[tokio::test]
async fn unknown_model_is_not_found() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server.client().get(server.url("/v1/models/gpt-4")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "model_not_found");
}
