use recap_llm::{ChatClient, ChatOptions, ChatRequest, LlmError, Message, OpenAIClient};
use std::time::Duration;

fn request() -> ChatRequest {
    ChatRequest::new("gpt-4o-mini", vec![Message::system("rules"), Message::human("context")])
        .with_options(ChatOptions::new().temperature(0.3).max_tokens(3000).json_mode())
}

#[tokio::test]
async fn test_chat_success_parses_content_and_usage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"response_format": {"type": "json_object"}, "max_tokens": 3000}"#.to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1,
                "model": "gpt-4o-mini",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "{\"overview\": \"ok\"}"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            }"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::with_options("test-key", server.url(), Duration::from_secs(5)).unwrap();
    let response = client.chat(request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("{\"overview\": \"ok\"}"));
    assert_eq!(response.model, "gpt-4o-mini");
    assert_eq!(response.usage.unwrap().total_tokens, 15);
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
}

#[tokio::test]
async fn test_unauthorized_is_not_retryable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error": {"message": "Incorrect API key"}}"#)
        .create_async()
        .await;

    let client = OpenAIClient::with_options("bad-key", server.url(), Duration::from_secs(5)).unwrap();
    let err = client.chat(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::Auth { status: 401, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let client = OpenAIClient::with_options("k", server.url(), Duration::from_secs(5)).unwrap();
    let err = client.chat(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::RateLimited(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_host_is_connection_error() {
    // Nothing listens on port 9 (discard) in test environments
    let client = OpenAIClient::with_options("k", "http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = client.chat(request()).await.unwrap_err();

    assert!(err.is_retryable(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_garbage_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = OpenAIClient::with_options("k", server.url(), Duration::from_secs(5)).unwrap();
    let err = client.chat(request()).await.unwrap_err();

    assert!(matches!(err, LlmError::InvalidResponse(_)));
    assert!(!err.is_retryable());
}
