use recap_types::{JobResult, ProgressEvent};
use serde::{Deserialize, Serialize};

/// Job lifecycle notifications fanned out to real-time subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Progress {
        job_id: String,
        meeting_id: String,
        #[serde(flatten)]
        progress: ProgressEvent,
    },
    
    Completed {
        job_id: String,
        meeting_id: String,
        result: JobResult,
    },
    
    Failed {
        job_id: String,
        meeting_id: String,
        error: String,
        /// Another attempt is scheduled
        will_retry: bool,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> &str {
        match self {
            Self::Progress { job_id, .. } | Self::Completed { job_id, .. } | Self::Failed { job_id, .. } => job_id,
        }
    }
}
