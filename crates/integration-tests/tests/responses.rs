mod harness;

use harness::config::ConfigBuilder;
use harness::mock_ollama::MockOllama;
use harness::server::TestServer;
use serde_json::{Value, json};

#[tokio::test]
async fn string_input_becomes_user_message() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/responses"))
        .json(&json!({"model": "llama3", "input": "Hello", "max_output_tokens": 32}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    assert!(body["id"].as_str().unwrap().starts_with("resp_"));
    assert_eq!(body["object"], "response");
    assert_eq!(body["model"], "llama3");
    assert_eq!(body["output"][0]["type"], "message");
    assert_eq!(body["output"][0]["role"], "assistant");
    assert_eq!(body["output"][0]["content"][0]["type"], "text");
    assert_eq!(body["output"][0]["content"][0]["text"], "Hi there");

    let sent = mock.last_chat();
    assert_eq!(sent["messages"], json!([{"role": "user", "content": "Hello"}]));
    assert_eq!(sent["options"]["num_predict"], 32);
}

#[tokio::test]
async fn item_input_keeps_roles_and_skips_empty_items() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/responses"))
        .json(&json!({
            "input": [
                {"role": "system", "content": "Be brief."},
                {"role": "user"},
                {"content": [{"type": "input_text", "text": "Hello"}]}
            ]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);

    let sent = mock.last_chat();
    let messages = sent["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "Hello");
}

#[tokio::test]
async fn missing_input_is_bad_request() {
    let mock = MockOllama::start().await.unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.url()).build()).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/v1/responses"))
        .json(&json!({"model": "llama3"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    assert_eq!(mock.chat_count(), 0);
}
