// Configuration layer for provider-agnostic LLM client creation

use crate::error::Result;
use crate::traits::ChatClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Type of LLM provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAI,
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
}

/// Configuration for OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL for OpenAI API (optional, defaults to https://api.openai.com/v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Configuration for Azure OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
}

impl AzureConfig {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
        }
    }
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderDetails {
    OpenAI(OpenAIConfig),
    #[serde(rename = "azure_openai")]
    AzureOpenAI(AzureConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl ProviderConfig {
    /// Create OpenAI provider config
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAI(OpenAIConfig::new(api_key)),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Create Azure OpenAI provider config
    /// 
    /// The deployment name is passed via the `model` field of each request.
    pub fn azure_openai(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            details: ProviderDetails::AzureOpenAI(AzureConfig::new(
                api_key,
                endpoint,
                api_version,
            )),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Get the provider type
    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::OpenAI(_) => ProviderType::OpenAI,
            ProviderDetails::AzureOpenAI(_) => ProviderType::AzureOpenAI,
        }
    }
}

/// Factory for creating LLM clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Create a chat client from provider configuration
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        let timeout = Duration::from_secs(config.timeout_secs);
        match config.details {
            ProviderDetails::OpenAI(openai_config) => {
                let base_url = openai_config
                    .base_url
                    .unwrap_or_else(|| crate::openai::OPENAI_API_BASE.to_string());
                let client =
                    crate::openai::OpenAIClient::with_options(openai_config.api_key, base_url, timeout)?;
                Ok(Arc::new(client))
            }
            ProviderDetails::AzureOpenAI(azure_config) => {
                let client = crate::azure_openai::AzureOpenAIClient::builder()
                    .api_key(azure_config.api_key)
                    .endpoint(azure_config.endpoint)
                    .api_version(azure_config.api_version)
                    .timeout(timeout)
                    .build()?;
                Ok(Arc::new(client))
            }
        }
    }
}
