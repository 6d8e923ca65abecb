//! End-to-end chat exchanges against a mock vendor API.

mod common;

use axum::http::StatusCode;
use common::{Harness, MockVendor};
use gptl::llm::{ChatError, ChatOptions, LLMError, Message};
use gptl::store::HistoryStore;
use serde_json::json;

fn two_choices() -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "first answer"}, "finish_reason": "stop"},
            {"index": 1, "message": {"role": "assistant", "content": "second answer"}, "finish_reason": "stop"}
        ]
    })
}

async fn chat(harness: &Harness, input: &str, history: &str) -> (Result<(), ChatError>, String) {
    let mut reader = input.as_bytes();
    let mut output = Vec::new();
    let options = ChatOptions::new().with_history(history);
    let result = harness
        .session
        .chat(&mut reader, &mut output, &options)
        .await;
    (result, String::from_utf8(output).unwrap())
}

// ============================================================================
// OpenAI
// ============================================================================

#[tokio::test]
async fn openai_request_shape() {
    let vendor = MockVendor::start(StatusCode::OK, two_choices()).await;
    let harness = Harness::new("openai", &format!("{}/v1", vendor.base_url), "gpt-4o");

    let (result, _) = chat(&harness, "Hello", "h").await;
    result.unwrap();

    let request = vendor.only_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v1/chat/completions");
    assert_eq!(request.query, None);
    assert_eq!(request.headers["authorization"], "Bearer test-key");
    assert_eq!(request.headers["content-type"], "application/json");
    assert_eq!(
        request.body,
        json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "Hello"}]})
    );
}

#[tokio::test]
async fn openai_two_choices_become_two_lines_and_history() {
    let vendor = MockVendor::start(StatusCode::OK, two_choices()).await;
    let harness = Harness::new("openai", &vendor.base_url, "gpt-4o");
    let prior = vec![Message::user("earlier"), Message::assistant("earlier reply")];
    harness.store.save("openai", "h", &prior).await.unwrap();

    let (result, output) = chat(&harness, "next", "h").await;
    result.unwrap();

    assert_eq!(output, "first answer\nsecond answer\n");
    let saved = harness.store.load("openai", "h").await.unwrap();
    assert_eq!(
        saved,
        vec![
            Message::user("earlier"),
            Message::assistant("earlier reply"),
            Message::user("next"),
            Message::assistant("first answer"),
            Message::assistant("second answer"),
        ]
    );

    // The vendor saw the full prior conversation plus the new turn.
    let request = vendor.only_request();
    assert_eq!(request.body["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn openai_error_keeps_history_untouched() {
    let vendor = MockVendor::start(
        StatusCode::UNAUTHORIZED,
        json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "param": null,
                "code": "invalid_api_key"
            }
        }),
    )
    .await;
    let harness = Harness::new("openai", &vendor.base_url, "gpt-4o");
    let prior = vec![Message::user("earlier"), Message::assistant("earlier reply")];
    harness.store.save("openai", "h", &prior).await.unwrap();
    let before = std::fs::read(harness.history_file("openai", "h")).unwrap();

    let (result, output) = chat(&harness, "next", "h").await;
    let err = result.unwrap_err();

    match &err {
        ChatError::LLM(LLMError::Api { status, message }) => {
            assert_eq!(*status, 401);
            assert_eq!(
                message,
                "Incorrect API key provided (invalid_api_key/invalid_request_error)"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("Incorrect API key provided"));
    assert!(output.is_empty());
    assert_eq!(
        std::fs::read(harness.history_file("openai", "h")).unwrap(),
        before
    );
}

#[tokio::test]
async fn structured_input_is_sent_verbatim() {
    let vendor = MockVendor::start(StatusCode::OK, two_choices()).await;
    let harness = Harness::new("openai", &vendor.base_url, "gpt-4o");

    let (result, _) = chat(&harness, r#"{"role":"system","content":"Be terse."}"#, "h").await;
    result.unwrap();

    let request = vendor.only_request();
    assert_eq!(
        request.body["messages"][0],
        json!({"role": "system", "content": "Be terse."})
    );
}

#[tokio::test]
async fn non_json_response_is_decode_error() {
    let vendor = MockVendor::start(StatusCode::OK, json!("not an object")).await;
    let harness = Harness::new("openai", &vendor.base_url, "gpt-4o");

    let (result, _) = chat(&harness, "hi", "h").await;
    assert!(matches!(
        result,
        Err(ChatError::LLM(LLMError::Decode { status: 200, .. }))
    ));
    assert!(!harness.history_file("openai", "h").exists());
}

#[tokio::test]
async fn unreachable_endpoint_is_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let harness = Harness::new("openai", &format!("http://{addr}"), "gpt-4o");

    let (result, _) = chat(&harness, "hi", "h").await;
    assert!(matches!(result, Err(ChatError::LLM(LLMError::Request(_)))));
}

// ============================================================================
// Azure OpenAI
// ============================================================================

#[tokio::test]
async fn azure_request_shape() {
    let vendor = MockVendor::start(StatusCode::OK, two_choices()).await;
    let harness = Harness::new("azure-openai", &vendor.base_url, "my-deployment");

    let (result, output) = chat(&harness, "Hello", "h").await;
    result.unwrap();
    assert_eq!(output, "first answer\nsecond answer\n");

    let request = vendor.only_request();
    assert_eq!(
        request.path,
        "/openai/deployments/my-deployment/chat/completions"
    );
    assert_eq!(request.query.as_deref(), Some("api-version=2023-05-15"));
    assert_eq!(request.headers["api-key"], "test-key");
    assert!(request.headers.get("authorization").is_none());
    assert_eq!(
        request.body,
        json!({"model": "my-deployment", "messages": [{"role": "user", "content": "Hello"}]})
    );
}

#[tokio::test]
async fn azure_history_lives_under_its_own_name() {
    let vendor = MockVendor::start(StatusCode::OK, two_choices()).await;
    let harness = Harness::new("azure-openai", &vendor.base_url, "dep");

    let (result, _) = chat(&harness, "Hello", "h").await;
    result.unwrap();

    assert!(harness.history_file("azure-openai", "h").is_file());
    assert!(harness.store.load("openai", "h").await.unwrap().is_empty());
}

// ============================================================================
// Claude
// ============================================================================

#[tokio::test]
async fn claude_request_shape() {
    let vendor = MockVendor::start(
        StatusCode::OK,
        json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Bonjour"}],
            "stop_reason": "end_turn"
        }),
    )
    .await;
    let harness = Harness::new("claude", &format!("{}/v1", vendor.base_url), "");

    let (result, output) = chat(&harness, "Hello", "h").await;
    result.unwrap();
    assert_eq!(output, "Bonjour\n");

    let request = vendor.only_request();
    assert_eq!(request.path, "/v1/messages");
    assert_eq!(request.headers["x-api-key"], "test-key");
    assert_eq!(request.headers["anthropic-version"], "2023-06-01");
    assert!(request.headers.get("authorization").is_none());
    assert_eq!(
        request.body,
        json!({
            "model": "claude-3-5-sonnet-20240620",
            "messages": [{"role": "user", "content": "Hello"}],
            "max_tokens": 1024
        })
    );
}

#[tokio::test]
async fn claude_content_blocks_become_separate_messages() {
    let vendor = MockVendor::start(
        StatusCode::OK,
        json!({
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "part one"},
                {"type": "text", "text": "part two"}
            ]
        }),
    )
    .await;
    let harness = Harness::new("claude", &vendor.base_url, "claude-3-haiku");

    let (result, output) = chat(&harness, "tell me", "h").await;
    result.unwrap();

    assert_eq!(output, "part one\npart two\n");
    let saved = harness.store.load("claude", "h").await.unwrap();
    assert_eq!(
        saved,
        vec![
            Message::user("tell me"),
            Message::assistant("part one"),
            Message::assistant("part two"),
        ]
    );
}

#[tokio::test]
async fn claude_error_reports_vendor_message() {
    let vendor = MockVendor::start(
        StatusCode::BAD_REQUEST,
        json!({
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "max_tokens: field required"}
        }),
    )
    .await;
    let harness = Harness::new("claude", &vendor.base_url, "claude-3-haiku");

    let (result, _) = chat(&harness, "hi", "h").await;
    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "api error (status 400): max_tokens: field required (invalid_request_error)"
    );
    assert!(!harness.history_file("claude", "h").exists());
}
