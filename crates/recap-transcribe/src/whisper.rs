// Whisper-style transcription: multipart upload, verbose JSON with timed segments

use crate::error::{Result, TranscribeError};
use crate::traits::Transcriber;
use crate::types::{AudioSource, Segment, TranscriptionOutput, TranscriptionProvider};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

pub struct WhisperClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
}

impl WhisperClient {
    pub fn new(
        api_key: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| TranscribeError::Config("Invalid API key format".to_string()))?,
        );
        
        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TranscribeError::Config(format!("Failed to create HTTP client: {}", e)))?;
        
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::Whisper
    }
    
    async fn transcribe(&self, source: &AudioSource, language: &str) -> Result<TranscriptionOutput> {
        let path = source.local_path.as_ref().ok_or(TranscribeError::MissingMedia)?;
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media.mp4")
            .to_string();
        
        tracing::debug!(size = bytes.len(), model = %self.model, "Uploading media for transcription");
        
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment")
            .text("language", language.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name));
        
        let response = self
            .http_client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form)
            .send()
            .await?;
        
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::from_status(status.as_u16(), body));
        }
        
        let body = response.text().await?;
        let verbose: VerboseTranscription = serde_json::from_str(&body)?;
        Ok(verbose.into_output(language))
    }
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
    #[serde(default)]
    avg_logprob: Option<f64>,
}

impl VerboseTranscription {
    fn into_output(self, language_hint: &str) -> TranscriptionOutput {
        // verbose_json reports the language by name ("english"); keep the hint unless
        // the provider already answered with a code
        let language = match self.language {
            Some(lang) if lang.len() == 2 => lang,
            _ => language_hint.to_string(),
        };
        
        TranscriptionOutput {
            text: self.text.trim().to_string(),
            segments: self
                .segments
                .into_iter()
                .map(|s| Segment {
                    start: s.start,
                    end: s.end,
                    speaker: None,
                    text: s.text.trim().to_string(),
                    confidence: confidence_from_logprob(s.avg_logprob),
                })
                .collect(),
            duration: self.duration,
            language: Some(language),
        }
    }
}

/// Segment confidence as `exp(avg_logprob)`, clamped to `[0, 1]`
pub fn confidence_from_logprob(avg_logprob: Option<f64>) -> f64 {
    match avg_logprob {
        Some(lp) if lp.is_finite() => lp.exp().clamp(0.0, 1.0),
        _ => 0.0,
    }
}
