//! Mock API tests for the chat completions client
//!
//! wiremock plays the OpenAI-compatible endpoint; streaming bodies follow the
//! `data: {...}` / `data: [DONE]` line format of OpenRouter and OpenAI.

use std::sync::{Arc, Mutex};

use llmcall::prelude::*;
use llmcall::types::token_count;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_body(lines: &[&str]) -> String {
    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push_str("\n\n");
    }
    body
}

fn delta_line(text: &str) -> String {
    format!(
        "data: {}",
        json!({"choices": [{"index": 0, "delta": {"content": text}}]})
    )
}

fn client_for(server: &MockServer) -> ChatClient {
    let config = ClientConfig::new("test-api-key")
        .with_base_url(server.uri())
        .with_model("test/model");
    ChatClient::new(config).unwrap()
}

#[tokio::test]
async fn test_streaming_chat_reduces_body() {
    let mock_server = MockServer::start().await;

    let hello = delta_line("Hello");
    let world = delta_line(", world");
    let usage = format!(
        "data: {}",
        json!({"choices": [], "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}})
    );
    let body = sse_body(&[
        ": OPENROUTER PROCESSING",
        &hello,
        &world,
        &usage,
        "data: [DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(json!({
            "model": "test/model",
            "stream": true,
            "max_tokens": 10000,
            "messages": [{"role": "user", "content": "Say hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = client.request(vec![ChatMessage::user("Say hello")]);
    let reduction = client.stream_chat(&request).await.unwrap();

    assert_eq!(reduction.content, "Hello, world");
    let usage = reduction.usage.expect("usage should be captured");
    assert_eq!(token_count(&usage, "total_tokens"), Some(8));
}

#[tokio::test]
async fn test_streaming_chat_forwards_deltas() {
    let mock_server = MockServer::start().await;

    let parts = ["{\"a\":", " 1", "}"];
    let lines: Vec<String> = parts.iter().map(|p| delta_line(p)).collect();
    let mut refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    refs.push("data: [DONE]");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body(&refs), "text/event-stream"))
        .mount(&mock_server)
        .await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let client = client_for(&mock_server);
    let request = client.request(vec![ChatMessage::user("json please")]);
    let outcome = client
        .send_with(&request, move |fragment| {
            sink_seen.lock().unwrap().push(fragment.to_string());
        })
        .await;

    assert!(outcome.is_completed());
    assert_eq!(outcome.into_compat().content, "{\"a\": 1}");
    assert_eq!(*seen.lock().unwrap(), vec!["{\"a\":", " 1", "}"]);
}

#[tokio::test]
async fn test_lines_after_done_are_ignored() {
    let mock_server = MockServer::start().await;

    let kept = delta_line("kept");
    let dropped = delta_line("dropped");
    let body = sse_body(&[&kept, "data: [DONE]", &dropped]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = client.request(vec![ChatMessage::user("q")]);
    let reduction = client.stream_chat(&request).await.unwrap();
    assert_eq!(reduction.content, "kept");
    assert!(reduction.usage.is_none());
}

#[tokio::test]
async fn test_body_without_done_is_still_reduced() {
    let mock_server = MockServer::start().await;

    let only = delta_line("partial");
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&[&only]), "text/event-stream"),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = client.request(vec![ChatMessage::user("q")]);
    let reduction = client.stream_chat(&request).await.unwrap();
    assert_eq!(reduction.content, "partial");
}

#[tokio::test]
async fn test_unauthorized_is_an_authentication_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "No auth credentials found", "code": 401}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = client.request(vec![ChatMessage::user("q")]);

    let err = client.stream_chat(&request).await.unwrap_err();
    assert!(matches!(err, LlmError::AuthenticationError(ref m) if m.contains("No auth")));
}

#[tokio::test]
async fn test_error_status_is_distinguishable_from_empty_answer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit exceeded", "code": 429}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = client.request(vec![ChatMessage::user("q")]);

    let outcome = client.send(&request).await;
    assert!(!outcome.is_completed());
    match outcome.clone() {
        ChatOutcome::Failed(LlmError::ApiError { code, message, .. }) => {
            assert_eq!(code, 429);
            assert_eq!(message, "Rate limit exceeded");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // Compatibility mode collapses the failure into an empty answer.
    let reduction = outcome.into_compat();
    assert_eq!(reduction.content, "");
    assert!(reduction.usage.is_none());
}

#[tokio::test]
async fn test_connection_refused_fails_without_panicking() {
    let config = ClientConfig::new("test-api-key").with_base_url("http://127.0.0.1:1");
    let client = ChatClient::new(config).unwrap();
    let request = client.request(vec![ChatMessage::user("q")]);

    let outcome = client.send(&request).await;
    let err = outcome.clone().into_result().unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
    assert!(outcome.into_compat().is_empty());
}

#[tokio::test]
async fn test_completion_with_tool_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gen-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "search_gutenberg_books",
                            "arguments": "{\"search_terms\": [\"james\", \"joyce\"]}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 20, "completion_tokens": 10, "total_tokens": 30}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = CompletionRequest::new("test/model", vec![ChatMessage::user("books?")]);
    let completion = client.complete(&request).await.unwrap();

    assert_eq!(completion.finish_reason.as_deref(), Some("tool_calls"));
    assert_eq!(completion.message.role, MessageRole::Assistant);
    assert_eq!(completion.message.content_text(), "");
    let call = &completion.message.tool_calls[0];
    assert_eq!(call.id, "call_1");
    assert_eq!(call.function.name, "search_gutenberg_books");
    let args: serde_json::Value = serde_json::from_str(&call.function.arguments).unwrap();
    assert_eq!(args, json!({"search_terms": ["james", "joyce"]}));
    assert_eq!(
        token_count(completion.usage.as_ref().unwrap(), "total_tokens"),
        Some(30)
    );
}

#[tokio::test]
async fn test_completion_error_envelope_with_ok_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "Provider returned error", "code": 502}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = CompletionRequest::new("test/model", vec![ChatMessage::user("q")]);
    let err = client.complete(&request).await.unwrap_err();
    assert!(matches!(err, LlmError::ApiError { ref message, .. } if message == "Provider returned error"));
}
