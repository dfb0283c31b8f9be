// Azure OpenAI-specific client implementation

use crate::error::{LlmError, Result};
use crate::openai::wire::{build_chat_payload, send_chat};
use crate::traits::{ChatClient, ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

/// Azure OpenAI client (HTTP direct, no SDK)
/// 
/// Azure OpenAI uses a different endpoint structure and authentication method than OpenAI:
/// - URL: https://{resource}.openai.azure.com/openai/deployments/{deployment}/...
/// - Auth header: api-key instead of Authorization: Bearer
/// - Deployment name is passed via the model parameter in each request
#[derive(Debug)]
pub struct AzureOpenAIClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_version: String,
}

impl AzureOpenAIClient {
    /// Create new Azure OpenAI client with builder pattern
    pub fn builder() -> AzureOpenAIClientBuilder {
        AzureOpenAIClientBuilder::default()
    }
    
    /// Build the full URL for an Azure OpenAI endpoint
    fn build_url(&self, deployment_name: &str, path: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment_name, path, self.api_version
        )
    }
}

/// Builder for AzureOpenAIClient
#[derive(Default)]
pub struct AzureOpenAIClientBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    api_version: Option<String>,
    timeout: Option<Duration>,
}

impl AzureOpenAIClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
    
    /// Set the Azure OpenAI endpoint (base URL)
    /// Example: "https://my-resource.openai.azure.com"
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
    
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }
    
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    
    pub fn build(self) -> Result<AzureOpenAIClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| LlmError::Config("API key is required".to_string()))?;
        let endpoint = self
            .endpoint
            .ok_or_else(|| LlmError::Config("Endpoint is required".to_string()))?;
        let api_version = self
            .api_version
            .ok_or_else(|| LlmError::Config("API version is required".to_string()))?;
        
        let endpoint = endpoint.trim_end_matches('/').to_string();
        
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(&api_key)
                .map_err(|_| LlmError::Config("Invalid API key format".to_string()))?,
        );
        
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(Duration::from_secs(120)))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;
        
        Ok(AzureOpenAIClient {
            http_client,
            endpoint,
            api_version,
        })
    }
}

#[async_trait]
impl ChatClient for AzureOpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        // Deployment is addressed by URL; the body carries no model field
        let url = self.build_url(&request.model, "chat/completions");
        let payload = build_chat_payload(&request.model, false, request.messages, &request.options);
        
        tracing::debug!(deployment = %request.model, "Sending Azure OpenAI chat completion");
        send_chat(&self.http_client, &url, &payload).await
    }
    
    fn provider_name(&self) -> &str {
        "azure_openai"
    }
}
