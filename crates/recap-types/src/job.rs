use serde::{Deserialize, Serialize};

use crate::processing_log::PipelineStage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Where the request came from (e.g. "manual", "auto")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Queue message for one summarization run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    pub meeting_id: String,
    #[serde(default)]
    pub regenerate: bool,
    #[serde(default)]
    pub options: JobOptions,
}

impl JobPayload {
    pub fn new(meeting_id: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            regenerate: false,
            options: JobOptions::default(),
        }
    }
    
    pub fn regenerate(mut self, regenerate: bool) -> Self {
        self.regenerate = regenerate;
        self
    }
    
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.options.source = Some(source.into());
        self
    }
}

/// Result stored on a completed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub success: bool,
    pub summary_id: String,
    pub version: u32,
    pub action_items_created: usize,
}

/// Progress event emitted on each stage transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: PipelineStage,
    pub percentage: u8,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            percentage: stage.percentage(),
            message: message.into(),
        }
    }
}
