use recap_llm::{AzureOpenAIClient, ChatClient, ChatRequest, Message};

#[test]
fn test_azure_client_builder_success() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint("https://test-resource.openai.azure.com")
        .api_version("2024-02-15-preview")
        .build();

    assert!(result.is_ok());
}

#[test]
fn test_azure_client_builder_missing_api_key() {
    let result = AzureOpenAIClient::builder()
        .endpoint("https://test-resource.openai.azure.com")
        .api_version("2024-02-15-preview")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("API key"));
}

#[test]
fn test_azure_client_builder_missing_endpoint() {
    let result = AzureOpenAIClient::builder()
        .api_key("test-key")
        .api_version("2024-02-15-preview")
        .build();

    let err_msg = result.err().unwrap().to_string();
    assert!(err_msg.contains("Endpoint"));
}

#[tokio::test]
async fn test_azure_routes_deployment_in_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/openai/deployments/summarizer/chat/completions")
        .match_query(mockito::Matcher::UrlEncoded("api-version".into(), "2024-02-15-preview".into()))
        .match_header("api-key", "test-key")
        .with_status(200)
        .with_body(
            r#"{"id": "1", "model": "gpt-4o", "choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"}]}"#,
        )
        .create_async()
        .await;

    let client = AzureOpenAIClient::builder()
        .api_key("test-key")
        .endpoint(format!("{}/", server.url()))
        .api_version("2024-02-15-preview")
        .build()
        .unwrap();

    let response = client
        .chat(ChatRequest::new("summarizer", vec![Message::human("hi")]))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("{}"));
    assert!(response.usage.is_none());
}
