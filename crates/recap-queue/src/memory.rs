use async_trait::async_trait;
use chrono::Utc;
use recap_types::{JobPayload, JobResult, ProgressEvent};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::{QueueError, Result};
use crate::job::{Job, JobSettings, JobState};
use crate::traits::JobQueue;

/// Single-process queue; state is lost on restart
pub struct InMemoryQueue {
    settings: JobSettings,
    jobs: Mutex<HashMap<String, Job>>,
}

impl InMemoryQueue {
    pub fn new(settings: JobSettings) -> Self {
        Self {
            settings,
            jobs: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new(JobSettings::default())
    }
}

fn sorted_by_creation(mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by_key(|j| j.created_at);
    jobs
}

#[async_trait]
impl JobQueue for InMemoryQueue {
    async fn enqueue(&self, payload: JobPayload) -> Result<Job> {
        let job = Job::new(payload, &self.settings);
        self.jobs.lock().await.insert(job.id.clone(), job.clone());
        tracing::debug!(job_id = %job.id, meeting_id = %job.meeting_id(), "Job enqueued");
        Ok(job)
    }
    
    async fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        Ok(self.jobs.lock().await.get(job_id).cloned())
    }
    
    async fn list_jobs(&self, states: &[JobState]) -> Result<Vec<Job>> {
        let jobs = self.jobs.lock().await;
        Ok(sorted_by_creation(
            jobs.values().filter(|j| states.contains(&j.state)).cloned().collect(),
        ))
    }
    
    async fn find_open_job(&self, meeting_id: &str) -> Result<Option<Job>> {
        let jobs = self.jobs.lock().await;
        Ok(jobs
            .values()
            .find(|j| j.meeting_id() == meeting_id && j.state.is_open())
            .cloned())
    }
    
    async fn claim_next(&self) -> Result<Option<Job>> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().await;
        let next = jobs
            .values_mut()
            .filter(|j| j.is_ready(now))
            .min_by_key(|j| (j.run_at, j.created_at));
        
        Ok(next.map(|job| {
            job.mark_active(now);
            job.clone()
        }))
    }
    
    async fn update_progress(&self, job_id: &str, progress: ProgressEvent) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        let job = active_job(&mut jobs, job_id)?;
        job.progress = Some(progress);
        job.updated_at = Utc::now();
        Ok(())
    }
    
    async fn complete(&self, job_id: &str, result: JobResult) -> Result<Job> {
        let mut jobs = self.jobs.lock().await;
        let job = active_job(&mut jobs, job_id)?;
        job.mark_completed(result, Utc::now());
        Ok(job.clone())
    }
    
    async fn fail(&self, job_id: &str, reason: &str, unrecoverable: bool) -> Result<Job> {
        let mut jobs = self.jobs.lock().await;
        let job = active_job(&mut jobs, job_id)?;
        job.mark_failed(reason, unrecoverable, Utc::now());
        Ok(job.clone())
    }
    
    async fn recover_stalled(&self) -> Result<Vec<Job>> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().await;
        let mut recovered = Vec::new();
        for job in jobs.values_mut().filter(|j| j.is_stalled(now)) {
            let reason = format!("job exceeded its {}ms timeout", job.timeout_ms);
            job.mark_failed(&reason, false, now);
            recovered.push(job.clone());
        }
        Ok(recovered)
    }
    
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

fn active_job<'a>(jobs: &'a mut HashMap<String, Job>, job_id: &str) -> Result<&'a mut Job> {
    let job = jobs
        .get_mut(job_id)
        .ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;
    if job.state != JobState::Active {
        return Err(QueueError::NotActive {
            job_id: job_id.to_string(),
            state: job.state,
        });
    }
    Ok(job)
}
