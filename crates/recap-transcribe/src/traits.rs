use crate::error::Result;
use crate::types::{AudioSource, TranscriptionOutput, TranscriptionProvider};
use async_trait::async_trait;

/// Speech-to-text capability
#[async_trait]
pub trait Transcriber: Send + Sync {
    fn provider(&self) -> TranscriptionProvider;
    
    /// Network providers get a bounded local copy of the media before `transcribe`
    fn is_network(&self) -> bool {
        self.provider() != TranscriptionProvider::None
    }
    
    /// Transcribe the media. `language` is a two-letter hint.
    async fn transcribe(&self, source: &AudioSource, language: &str) -> Result<TranscriptionOutput>;
}
