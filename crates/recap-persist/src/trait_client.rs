use async_trait::async_trait;
use recap_types::{ActionItem, Meeting, ProcessingLog, ProcessingStatus, Summary, Transcript};
use crate::error::Result;

/// Storage operations the summarization pipeline depends on.
///
/// Meetings are owned by the surrounding application; only their processing
/// fields are written here.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Load a meeting by ID
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>>;
    
    /// Set the meeting's processing status, recording the job when given
    async fn set_processing_status(
        &self,
        meeting_id: &str,
        status: ProcessingStatus,
        job_id: Option<&str>,
    ) -> Result<()>;
    
    /// Point the meeting at its transcript
    async fn attach_transcript(&self, meeting_id: &str, transcript_id: &str) -> Result<()>;
    
    /// Mark the meeting completed with its new latest summary, appending it to the history
    async fn complete_meeting(&self, meeting_id: &str, summary_id: &str) -> Result<()>;
    
    /// Most recent `completed` transcript for a meeting
    async fn find_completed_transcript(&self, meeting_id: &str) -> Result<Option<Transcript>>;
    
    async fn insert_transcript(&self, transcript: Transcript) -> Result<()>;
    
    async fn list_transcripts(&self, meeting_id: &str) -> Result<Vec<Transcript>>;
    
    /// Highest stored summary version for a meeting, 0 when none
    async fn latest_version(&self, meeting_id: &str) -> Result<u32>;
    
    /// Store `summary` as the meeting's next version.
    ///
    /// Assigns `version = max + 1`, sets `is_latest` and clears the flag on every
    /// other version of the meeting in one atomic write. Returns the stored summary.
    async fn insert_summary_version(&self, summary: Summary) -> Result<Summary>;
    
    /// Summaries of a meeting ordered by version
    async fn list_summaries(&self, meeting_id: &str) -> Result<Vec<Summary>>;
    
    async fn latest_summary(&self, meeting_id: &str) -> Result<Option<Summary>>;
    
    /// Bulk insert, returning the inserted IDs in order
    async fn insert_action_items(&self, items: Vec<ActionItem>) -> Result<Vec<String>>;
    
    /// Replace the summary's action-item references
    async fn set_summary_action_items(&self, summary_id: &str, item_ids: &[String]) -> Result<()>;
    
    async fn list_action_items(&self, summary_id: &str) -> Result<Vec<ActionItem>>;
    
    /// Append-only; rows are never updated
    async fn append_processing_log(&self, log: ProcessingLog) -> Result<()>;
    
    /// Log rows of one job in insertion order
    async fn list_processing_logs(&self, job_id: &str) -> Result<Vec<ProcessingLog>>;
    
    /// Cheap connectivity check
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
