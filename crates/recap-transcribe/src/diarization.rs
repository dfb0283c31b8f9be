// Diarization-capable hosted transcription: submit by URL, poll until done

use crate::error::{Result, TranscribeError};
use crate::traits::Transcriber;
use crate::types::{AudioSource, Segment, TranscriptionOutput, TranscriptionProvider};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;

pub struct DiarizationClient {
    http_client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl DiarizationClient {
    pub fn new(
        api_key: &str,
        base_url: impl Into<String>,
        timeout: Duration,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(api_key)
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
            poll_interval,
            max_polls: max_polls.max(1),
        })
    }
    
    async fn submit(&self, audio_url: &str, language: &str) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/v2/transcript", self.base_url))
            .json(&serde_json::json!({
                "audio_url": audio_url,
                "speaker_labels": true,
                "language_code": language,
            }))
            .send()
            .await?;
        
        let job: RemoteTranscript = parse_response(response).await?;
        Ok(job.id)
    }
    
    async fn fetch(&self, id: &str) -> Result<RemoteTranscript> {
        let response = self
            .http_client
            .get(format!("{}/v2/transcript/{}", self.base_url, id))
            .send()
            .await?;
        parse_response(response).await
    }
}

async fn parse_response(response: reqwest::Response) -> Result<RemoteTranscript> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TranscribeError::from_status(status.as_u16(), body));
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl Transcriber for DiarizationClient {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::Diarization
    }
    
    async fn transcribe(&self, source: &AudioSource, language: &str) -> Result<TranscriptionOutput> {
        let id = self.submit(&source.url, language).await?;
        tracing::info!(remote_id = %id, "Submitted media for diarized transcription");
        
        for poll in 1..=self.max_polls {
            let transcript = self.fetch(&id).await?;
            match transcript.status.as_str() {
                "completed" => return Ok(transcript.into_output(language)),
                "error" => {
                    return Err(TranscribeError::Provider(
                        transcript.error.unwrap_or_else(|| "unknown error".to_string()),
                    ))
                }
                other => {
                    tracing::debug!(remote_id = %id, status = other, poll, "Transcription still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
        
        Err(TranscribeError::PollTimeout { polls: self.max_polls })
    }
}

#[derive(Debug, Deserialize)]
struct RemoteTranscript {
    id: String,
    status: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    audio_duration: Option<f64>,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    utterances: Option<Vec<Utterance>>,
}

#[derive(Debug, Deserialize)]
struct Utterance {
    speaker: String,
    text: String,
    /// Milliseconds
    start: u64,
    end: u64,
    #[serde(default)]
    confidence: Option<f64>,
}

impl RemoteTranscript {
    fn into_output(self, language_hint: &str) -> TranscriptionOutput {
        let segments: Vec<Segment> = self
            .utterances
            .unwrap_or_default()
            .into_iter()
            .map(|u| Segment {
                start: u.start as f64 / 1000.0,
                end: u.end as f64 / 1000.0,
                speaker: Some(format!("Speaker {}", u.speaker)),
                text: u.text,
                confidence: u.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            })
            .collect();
        
        // Prefer speaker-labeled lines so downstream prompts keep attribution
        let text = if segments.is_empty() {
            self.text.unwrap_or_default()
        } else {
            segments
                .iter()
                .map(|s| format!("{}: {}", s.speaker.as_deref().unwrap_or("Speaker"), s.text))
                .collect::<Vec<_>>()
                .join("\n")
        };
        
        TranscriptionOutput {
            text: text.trim().to_string(),
            segments,
            duration: self.audio_duration,
            language: Some(
                self.language_code
                    .map(|code| code.chars().take(2).collect())
                    .unwrap_or_else(|| language_hint.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterances_become_speaker_segments() {
        let remote: RemoteTranscript = serde_json::from_str(
            r#"{"id": "abc", "status": "completed", "text": "hi there. ship it",
                "audio_duration": 4.0, "language_code": "en_us",
                "utterances": [
                    {"speaker": "A", "text": "hi there.", "start": 0, "end": 1500, "confidence": 0.93},
                    {"speaker": "B", "text": "ship it", "start": 1500, "end": 4000, "confidence": 0.88}
                ]}"#,
        )
        .unwrap();

        let output = remote.into_output("fr");
        assert_eq!(output.segments.len(), 2);
        assert_eq!(output.segments[1].start, 1.5);
        assert_eq!(output.segments[1].speaker.as_deref(), Some("Speaker B"));
        assert_eq!(output.text, "Speaker A: hi there.\nSpeaker B: ship it");
        assert_eq!(output.language.as_deref(), Some("en"));
    }
}
