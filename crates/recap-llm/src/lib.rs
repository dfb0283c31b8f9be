pub mod types;
pub mod traits;
pub mod error;
pub mod config;
pub mod openai;
pub mod azure_openai;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, ResponseFormat, TokenUsage};
pub use error::{LlmError, Result};
pub use config::{ClientFactory, ProviderConfig, ProviderType};
pub use openai::OpenAIClient;
pub use azure_openai::AzureOpenAIClient;
pub use types::Message;
