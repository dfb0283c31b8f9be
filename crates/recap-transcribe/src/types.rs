use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which transcription backend is in use.
///
/// Chosen once at process start; the pipeline never branches on it per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    /// Transcription disabled; produces skipped transcripts
    None,
    /// Upload-based, returns timed segments with log-probabilities
    Whisper,
    /// URL-based hosted service returning speaker-labeled utterances
    Diarization,
}

impl TranscriptionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Whisper => "whisper",
            Self::Diarization => "diarization",
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media handed to a provider: always the original URL, plus a local copy when
/// the caller downloaded one.
#[derive(Debug, Clone)]
pub struct AudioSource {
    pub url: String,
    pub local_path: Option<PathBuf>,
}

impl AudioSource {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local_path: None,
        }
    }
    
    pub fn with_local_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Seconds from start of media
    pub start: f64,
    pub end: f64,
    pub speaker: Option<String>,
    pub text: String,
    /// In `[0, 1]`
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    pub text: String,
    pub segments: Vec<Segment>,
    pub duration: Option<f64>,
    pub language: Option<String>,
}

impl TranscriptionOutput {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            segments: Vec::new(),
            duration: None,
            language: None,
        }
    }
}
