use recap_llm::LlmError;
use recap_persist::PersistError;
use recap_transcribe::TranscribeError;
use thiserror::Error;

use crate::download::DownloadError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),
    
    #[error("Meeting {0} has no video source and no transcript")]
    MissingMedia(String),
    
    #[error("Media download failed: {0}")]
    Download(#[from] DownloadError),
    
    #[error("Transcription failed: {0}")]
    Transcription(#[from] TranscribeError),
    
    #[error("Transcription provider returned no text")]
    EmptyTranscript,
    
    #[error("Summarization failed: {0}")]
    Llm(#[from] LlmError),
    
    #[error("Storage error: {0}")]
    Storage(#[from] PersistError),
    
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// The queue stopped awaiting the attempt
    #[error("Job attempt abandoned: {0}")]
    TimedOut(String),
}

impl PipelineError {
    /// Failures another attempt cannot fix; the queue fails these immediately
    pub fn is_unrecoverable(&self) -> bool {
        match self {
            Self::MeetingNotFound(_) | Self::MissingMedia(_) | Self::EmptyTranscript | Self::Config(_) => true,
            Self::Download(e) => !e.is_retryable(),
            Self::Transcription(e) => !e.is_retryable(),
            Self::Llm(e) => !e.is_retryable(),
            Self::Storage(e) => !e.is_retryable(),
            Self::TimedOut(_) => false,
        }
    }
    
    /// The error and its source chain, one cause per line
    pub fn error_stack(&self) -> String {
        let mut stack = format!("{}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            stack.push_str("\ncaused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }
        stack
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
