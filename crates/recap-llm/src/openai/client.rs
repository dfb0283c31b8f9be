// OpenAI-specific client implementation

use crate::error::{LlmError, Result};
use crate::openai::wire::{build_chat_payload, send_chat};
use crate::traits::{ChatClient, ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, OPENAI_API_BASE, DEFAULT_TIMEOUT)
    }
    
    /// Create client against a custom base URL with an explicit request timeout.
    ///
    /// The timeout must stay below the job timeout of whatever drives this client.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| LlmError::Config("Invalid API key format".to_string()))?,
        );
        
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;
        
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
    
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = build_chat_payload(&request.model, true, request.messages, &request.options);
        
        tracing::debug!(model = %request.model, "Sending OpenAI chat completion");
        send_chat(
            &self.http_client,
            &format!("{}/chat/completions", self.base_url),
            &payload,
        )
        .await
    }
    
    fn provider_name(&self) -> &str {
        "openai"
    }
}
