use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Bounds applied to meeting attachments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentLimits {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_max_chars_per_file")]
    pub max_chars_per_file: usize,
    #[serde(default = "default_max_total_chars")]
    pub max_total_chars: usize,
    #[serde(default = "default_attachment_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_max_chars_per_file() -> usize {
    4_000
}

fn default_max_total_chars() -> usize {
    12_000
}

fn default_attachment_timeout_secs() -> u64 {
    15
}

impl Default for AttachmentLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_chars_per_file: default_max_chars_per_file(),
            max_total_chars: default_max_total_chars(),
            request_timeout_secs: default_attachment_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chat model or Azure deployment name
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Two-letter language used when the meeting has none
    #[serde(default = "default_language")]
    pub default_language: String,
    
    #[serde(default = "default_summarize_attempts")]
    pub summarize_attempts: usize,
    #[serde(default = "default_initial_backoff_ms")]
    pub summarize_initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub summarize_max_backoff_ms: u64,
    
    #[serde(default = "default_chat_message_limit")]
    pub chat_message_limit: usize,
    #[serde(default = "default_chat_max_bytes")]
    pub chat_max_bytes: u64,
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    
    #[serde(default = "default_max_video_bytes")]
    pub max_video_bytes: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Where downloaded media is staged; system temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    
    #[serde(default)]
    pub attachments: AttachmentLimits,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    3_000
}

fn default_language() -> String {
    "en".to_string()
}

fn default_summarize_attempts() -> usize {
    3
}

fn default_initial_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_chat_message_limit() -> usize {
    50
}

fn default_chat_max_bytes() -> u64 {
    1024 * 1024
}

fn default_max_transcript_chars() -> usize {
    60_000
}

fn default_max_context_chars() -> usize {
    90_000
}

fn default_max_video_bytes() -> u64 {
    25 * 1024 * 1024
}

fn default_download_timeout_secs() -> u64 {
    120
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            default_language: default_language(),
            summarize_attempts: default_summarize_attempts(),
            summarize_initial_backoff_ms: default_initial_backoff_ms(),
            summarize_max_backoff_ms: default_max_backoff_ms(),
            chat_message_limit: default_chat_message_limit(),
            chat_max_bytes: default_chat_max_bytes(),
            max_transcript_chars: default_max_transcript_chars(),
            max_context_chars: default_max_context_chars(),
            max_video_bytes: default_max_video_bytes(),
            download_timeout_secs: default_download_timeout_secs(),
            temp_dir: None,
            attachments: AttachmentLimits::default(),
        }
    }
}

impl PipelineConfig {
    pub fn summarize_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.summarize_attempts).with_backoff(
            Duration::from_millis(self.summarize_initial_backoff_ms),
            Duration::from_millis(self.summarize_max_backoff_ms),
        )
    }
    
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}
