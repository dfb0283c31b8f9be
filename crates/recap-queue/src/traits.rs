use async_trait::async_trait;
use recap_types::{JobPayload, JobResult, ProgressEvent};

use crate::error::Result;
use crate::job::{Job, JobState};

/// At-least-once work queue for summarization jobs.
///
/// Deduplication happens only by job id. Callers that must not double-enqueue
/// a meeting check `find_open_job` first.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Add a job in the `waiting` state
    async fn enqueue(&self, payload: JobPayload) -> Result<Job>;
    
    async fn get_job(&self, job_id: &str) -> Result<Option<Job>>;
    
    /// Jobs in any of `states`, oldest first
    async fn list_jobs(&self, states: &[JobState]) -> Result<Vec<Job>>;
    
    /// A waiting, delayed or active job for the meeting, if any
    async fn find_open_job(&self, meeting_id: &str) -> Result<Option<Job>>;
    
    /// Atomically move the oldest ready job to `active`
    async fn claim_next(&self) -> Result<Option<Job>>;
    
    async fn update_progress(&self, job_id: &str, progress: ProgressEvent) -> Result<()>;
    
    async fn complete(&self, job_id: &str, result: JobResult) -> Result<Job>;
    
    /// Record a failed attempt. The job is retried after its backoff unless the
    /// error is unrecoverable or attempts are exhausted.
    async fn fail(&self, job_id: &str, reason: &str, unrecoverable: bool) -> Result<Job>;
    
    /// Fail active jobs that outlived their timeout, returning them
    async fn recover_stalled(&self) -> Result<Vec<Job>>;
    
    async fn ping(&self) -> Result<()>;
}
