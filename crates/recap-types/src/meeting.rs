use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Meeting-level processing status, written by the pipeline at phase boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            url: url.into(),
        }
    }
}

/// A meeting as seen by the pipeline.
///
/// Meetings belong to the surrounding application; the pipeline only reads the
/// media references and writes the processing fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Meeting {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub participants: Vec<String>,
    /// Two-letter spoken language, when known
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub video_link: Option<String>,
    #[serde(default)]
    pub chat_history_url: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    #[serde(default)]
    pub last_job_id: Option<String>,
    #[serde(default)]
    pub transcript_id: Option<String>,
    #[serde(default)]
    pub summary_id: Option<String>,
    /// Every summary ever produced for this meeting, oldest first
    #[serde(default)]
    pub summary_history: Vec<String>,
}

impl Meeting {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
    
    pub fn with_video(mut self, url: impl Into<String>) -> Self {
        self.video_link = Some(url.into());
        self
    }
    
    pub fn with_chat_history(mut self, url: impl Into<String>) -> Self {
        self.chat_history_url = Some(url.into());
        self
    }
    
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
    
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
    
    /// Video reference, ignoring blank values
    pub fn video_source(&self) -> Option<&str> {
        self.video_link
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
