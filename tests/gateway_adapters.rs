use std::time::Duration;

use sentio_harness::gateway::{
    AnthropicAdapter, ChatBackend, ChatRequest, Message, OpenAiCompatAdapter, ProviderError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_adapter(server: &MockServer) -> OpenAiCompatAdapter {
    OpenAiCompatAdapter::with_config("openai", "sk-test", server.uri(), Duration::from_secs(5))
        .unwrap()
}

#[tokio::test]
async fn openai_compat_parses_first_choice_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "hello" } }]
        })))
        .mount(&server)
        .await;

    let adapter = openai_adapter(&server);
    let req = ChatRequest::single_turn("gpt-4o-mini", "hi");

    let resp = adapter.chat(&req).await.unwrap();
    assert_eq!(resp.content, "hello");
}

#[tokio::test]
async fn openai_compat_sends_model_and_single_user_turn() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "grok-2-latest",
            "messages": [{ "role": "user", "content": "ping" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "pong" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = openai_adapter(&server);
    let req = ChatRequest::single_turn("grok-2-latest", "ping");

    let resp = adapter.chat(&req).await.unwrap();
    assert_eq!(resp.content, "pong");
}

#[tokio::test]
async fn openai_compat_surfaces_error_body_with_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "invalid api key" }
        })))
        .mount(&server)
        .await;

    let adapter = openai_adapter(&server);
    let req = ChatRequest::single_turn("gpt-4o-mini", "hi");

    let err = adapter.chat(&req).await.unwrap_err();
    match err {
        ProviderError::Provider {
            provider,
            message,
            http_status,
        } => {
            assert_eq!(provider, "openai");
            assert_eq!(message, "invalid api key");
            assert_eq!(http_status, Some(401));
        }
        other => panic!("expected Provider, got {other:?}"),
    }
}

#[tokio::test]
async fn openai_compat_reports_bare_status_when_body_is_opaque() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream gone"))
        .mount(&server)
        .await;

    let adapter = openai_adapter(&server);
    let req = ChatRequest::single_turn("gpt-4o-mini", "hi");

    let err = adapter.chat(&req).await.unwrap_err();
    match err {
        ProviderError::Provider { http_status, .. } => assert_eq!(http_status, Some(503)),
        other => panic!("expected Provider, got {other:?}"),
    }
}

#[tokio::test]
async fn openai_compat_rejects_missing_choices() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let adapter = openai_adapter(&server);
    let req = ChatRequest::single_turn("gpt-4o-mini", "hi");

    let err = adapter.chat(&req).await.unwrap_err();
    assert!(matches!(err, ProviderError::Provider { .. }));
}

#[tokio::test]
async fn anthropic_sends_version_header_and_parses_text_block() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20240620",
            "max_tokens": 4096
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "type": "thinking", "thinking": "..." },
                { "type": "text", "text": "hello from claude" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter =
        AnthropicAdapter::with_config("sk-ant-test", server.uri(), Duration::from_secs(5)).unwrap();
    let req = ChatRequest::single_turn("claude-3-5-sonnet-20240620", "hi");

    let resp = adapter.chat(&req).await.unwrap();
    assert_eq!(resp.content, "hello from claude");
}

#[tokio::test]
async fn anthropic_moves_system_message_to_top_level() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({
            "system": "be terse",
            "messages": [{ "role": "user", "content": "hi" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "ok" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter =
        AnthropicAdapter::with_config("sk-ant-test", server.uri(), Duration::from_secs(5)).unwrap();
    let req = ChatRequest::new(
        "claude-3-5-sonnet-20240620",
        vec![Message::system("be terse"), Message::user("hi")],
    );

    let resp = adapter.chat(&req).await.unwrap();
    assert_eq!(resp.content, "ok");
}

#[tokio::test]
async fn anthropic_surfaces_api_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "type": "error",
            "error": { "type": "rate_limit_error", "message": "slow down" }
        })))
        .mount(&server)
        .await;

    let adapter =
        AnthropicAdapter::with_config("sk-ant-test", server.uri(), Duration::from_secs(5)).unwrap();
    let req = ChatRequest::single_turn("claude-3-5-sonnet-20240620", "hi");

    let err = adapter.chat(&req).await.unwrap_err();
    match err {
        ProviderError::Provider {
            provider,
            message,
            http_status,
        } => {
            assert_eq!(provider, "anthropic");
            assert_eq!(message, "slow down");
            assert_eq!(http_status, Some(429));
        }
        other => panic!("expected Provider, got {other:?}"),
    }
}
