use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use recap_llm::TokenUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Retrieve,
    Merge,
    Summarize,
    Format,
    Save,
    Error,
    Complete,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Merge => "merge",
            Self::Summarize => "summarize",
            Self::Format => "format",
            Self::Save => "save",
            Self::Error => "error",
            Self::Complete => "complete",
        }
    }
    
    /// Happy-path progress percentage reported when entering the stage
    pub fn percentage(&self) -> u8 {
        match self {
            Self::Retrieve => 10,
            Self::Merge => 30,
            Self::Summarize => 50,
            Self::Format => 75,
            Self::Save => 90,
            Self::Complete => 100,
            Self::Error => 0,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Started,
    Processing,
    Completed,
    Failed,
}

/// One observed stage transition. Rows are inserted once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLog {
    pub id: String,
    pub job_id: String,
    pub meeting_id: String,
    pub stage: PipelineStage,
    pub status: StageStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ProcessingLog {
    pub fn new(
        job_id: impl Into<String>,
        meeting_id: impl Into<String>,
        stage: PipelineStage,
        status: StageStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            job_id: job_id.into(),
            meeting_id: meeting_id.into(),
            stage,
            status,
            started_at: now,
            duration_ms: None,
            tokens: None,
            error_message: None,
            error_stack: None,
            metadata: serde_json::Value::Null,
            created_at: now,
        }
    }
    
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = at;
        self
    }
    
    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }
    
    pub fn tokens(mut self, usage: Option<TokenUsage>) -> Self {
        self.tokens = usage;
        self
    }
    
    pub fn error(mut self, message: impl Into<String>, stack: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self.error_stack = Some(stack.into());
        self
    }
    
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
