// Chat Completions wire format shared by the OpenAI and Azure OpenAI clients

use crate::error::{LlmError, Result};
use crate::traits::{ChatOptions, ChatResponse, ResponseFormat, TokenUsage};
use crate::types::Message;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Build chat completion request payload
///
/// Azure addresses the deployment in the URL, so `include_model` is false there.
pub(crate) fn build_chat_payload(
    model: &str,
    include_model: bool,
    messages: Vec<Message>,
    options: &ChatOptions,
) -> Value {
    let mut obj = Map::new();
    
    if include_model {
        obj.insert("model".to_string(), json!(model));
    }
    obj.insert(
        "messages".to_string(),
        Value::Array(messages.into_iter().map(convert_message).collect()),
    );
    
    // o1 and gpt-5 models reject temperature and use max_completion_tokens
    let is_reasoning_model = model.starts_with("o1") || model.starts_with("gpt-5");
    
    if let Some(temp) = options.temperature {
        if !is_reasoning_model {
            obj.insert("temperature".to_string(), json!(temp));
        }
    }
    if let Some(max_tokens) = options.max_tokens {
        let token_field = if is_reasoning_model {
            "max_completion_tokens"
        } else {
            "max_tokens"
        };
        obj.insert(token_field.to_string(), json!(max_tokens));
    }
    if let Some(ResponseFormat::JsonObject) = options.response_format {
        obj.insert("response_format".to_string(), json!({ "type": "json_object" }));
    }
    
    Value::Object(obj)
}

fn convert_message(message: Message) -> Value {
    json!({
        "role": message.role(),
        "content": message.content(),
    })
}

/// POST a payload and convert the provider response
pub(crate) async fn send_chat(
    http_client: &reqwest::Client,
    url: &str,
    payload: &Value,
) -> Result<ChatResponse> {
    let response = http_client.post(url).json(payload).send().await?;
    
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(LlmError::from_status(status.as_u16(), error_text));
    }
    
    let body = response.text().await?;
    let raw: WireChatResponse = serde_json::from_str(&body)?;
    
    let choice = raw.choices.first();
    Ok(ChatResponse {
        content: choice.and_then(|c| c.message.content.clone()),
        model: raw.model.clone(),
        usage: raw.usage.as_ref().map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }),
        finish_reason: choice.and_then(|c| c.finish_reason.clone()),
        raw: serde_json::to_value(&raw)?,
    })
}

// ============================================================================
// RESPONSE TYPES (Chat Completions)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireChatResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}
