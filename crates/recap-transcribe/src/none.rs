use crate::error::Result;
use crate::traits::Transcriber;
use crate::types::{AudioSource, TranscriptionOutput, TranscriptionProvider};
use async_trait::async_trait;

/// Used when transcription is administratively disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTranscriber;

#[async_trait]
impl Transcriber for NoopTranscriber {
    fn provider(&self) -> TranscriptionProvider {
        TranscriptionProvider::None
    }
    
    async fn transcribe(&self, _source: &AudioSource, language: &str) -> Result<TranscriptionOutput> {
        Ok(TranscriptionOutput {
            language: Some(language.to_string()),
            ..TranscriptionOutput::empty()
        })
    }
}
