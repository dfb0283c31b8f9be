// Static provider selection, resolved once at process start

use crate::diarization::DiarizationClient;
use crate::error::{Result, TranscribeError};
use crate::none::NoopTranscriber;
use crate::traits::Transcriber;
use crate::whisper::WhisperClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_whisper_base_url")]
    pub base_url: String,
    #[serde(default = "default_whisper_model")]
    pub model: String,
    #[serde(default = "default_whisper_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_whisper_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_whisper_timeout_secs() -> u64 {
    240
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_diarization_base_url")]
    pub base_url: String,
    #[serde(default = "default_diarization_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_diarization_base_url() -> String {
    "https://api.assemblyai.com".to_string()
}

fn default_diarization_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_max_polls() -> u32 {
    80
}

/// Which transcription backend the worker runs with
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum TranscriptionConfig {
    #[default]
    None,
    Whisper(WhisperConfig),
    Diarization(DiarizationConfig),
}

impl TranscriptionConfig {
    /// Fill the secret for whichever provider is selected
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        match &mut self {
            Self::None => {}
            Self::Whisper(c) => c.api_key = key.into(),
            Self::Diarization(c) => c.api_key = key.into(),
        }
        self
    }
}

/// Build the transcriber selected by configuration
pub fn create_transcriber(config: TranscriptionConfig) -> Result<Arc<dyn Transcriber>> {
    match config {
        TranscriptionConfig::None => Ok(Arc::new(NoopTranscriber)),
        TranscriptionConfig::Whisper(c) => {
            if c.api_key.is_empty() {
                return Err(TranscribeError::Config("whisper api_key is required".to_string()));
            }
            Ok(Arc::new(WhisperClient::new(
                &c.api_key,
                c.base_url,
                c.model,
                Duration::from_secs(c.timeout_secs),
            )?))
        }
        TranscriptionConfig::Diarization(c) => {
            if c.api_key.is_empty() {
                return Err(TranscribeError::Config("diarization api_key is required".to_string()));
            }
            Ok(Arc::new(DiarizationClient::new(
                &c.api_key,
                c.base_url,
                Duration::from_secs(c.timeout_secs),
                Duration::from_millis(c.poll_interval_ms),
                c.max_polls,
            )?))
        }
    }
}
