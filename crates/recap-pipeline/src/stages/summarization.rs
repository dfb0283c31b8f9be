use std::sync::Arc;

use recap_llm::{ChatClient, ChatOptions, ChatRequest, LlmError, Message, TokenUsage};
use tracing::{debug, info};

use crate::parse::{parse_model_output, ParseOutcome};
use crate::prompt::{system_prompt, user_prompt};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct SummarizationOutput {
    pub raw: String,
    pub outcome: ParseOutcome,
    pub usage: Option<TokenUsage>,
    /// Chat calls made, including the successful one
    pub attempts: usize,
    pub model: String,
}

pub struct SummarizationStage {
    client: Arc<dyn ChatClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl SummarizationStage {
    pub fn new(
        client: Arc<dyn ChatClient>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
            retry,
        }
    }
    
    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }
    
    pub fn model(&self) -> &str {
        &self.model
    }
    
    pub fn temperature(&self) -> f32 {
        self.temperature
    }
    
    /// One system + one user message in JSON mode, retried on connection-class errors.
    /// Unusable model output is not an error; it comes back as `EmptyFallback`.
    pub async fn summarize(&self, context: &str, language: &str) -> Result<SummarizationOutput, LlmError> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                Message::system(system_prompt(language)),
                Message::human(user_prompt(context)),
            ],
        )
        .with_options(
            ChatOptions::new()
                .temperature(self.temperature)
                .max_tokens(self.max_tokens)
                .json_mode(),
        );
        
        let mut attempts = 0;
        let response = self
            .retry
            .execute(|| {
                attempts += 1;
                self.client.chat(request.clone())
            })
            .await?;
        
        let raw = response.content.unwrap_or_default();
        let outcome = parse_model_output(&raw);
        debug!(chars = raw.len(), outcome = outcome.kind(), "Model output parsed");
        info!(
            model = %response.model,
            attempts,
            outcome = outcome.kind(),
            tokens = response.usage.map(|u| u.total_tokens).unwrap_or(0),
            "Summary generated"
        );
        
        Ok(SummarizationOutput {
            raw,
            outcome,
            usage: response.usage,
            attempts,
            model: response.model,
        })
    }
}
