use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Seconds from the start of the recording
    pub start: f64,
    pub end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub text: String,
    pub confidence: f64,
}

/// Speech-to-text result for one meeting recording.
///
/// A `Completed` transcript always carries non-empty text and is never mutated
/// afterwards. `Failed` and `Skipped` transcripts do not block a later attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub meeting_id: String,
    pub source_url: Option<String>,
    pub duration_secs: Option<f64>,
    pub raw_text: String,
    pub cleaned_text: String,
    pub segments: Vec<TranscriptSegment>,
    pub provider: String,
    pub language: Option<String>,
    pub status: TranscriptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transcript {
    /// Whether this transcript can be fed to summarization as-is
    pub fn is_usable(&self) -> bool {
        self.status == TranscriptStatus::Completed
    }
    
    /// Text for prompting: cleaned text, falling back to raw
    pub fn text(&self) -> &str {
        if self.cleaned_text.trim().is_empty() {
            &self.raw_text
        } else {
            &self.cleaned_text
        }
    }
}

/// Collapse whitespace runs and trim, keeping line structure between segments
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
