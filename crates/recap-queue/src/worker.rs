// Concurrent job runner: bounded slots, per-job timeout, graceful shutdown

use async_trait::async_trait;
use recap_types::{JobResult, ProgressEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Semaphore};

use crate::error::Result;
use crate::events::JobEvent;
use crate::job::{Job, JobState};
use crate::traits::JobQueue;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Jobs processed at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Sleep between polls when no job is ready
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_stalled_check_interval_ms")]
    pub stalled_check_interval_ms: u64,
}

fn default_concurrency() -> usize {
    2
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_stalled_check_interval_ms() -> u64 {
    30_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
            stalled_check_interval_ms: default_stalled_check_interval_ms(),
        }
    }
}

/// Failure reported by a handler
#[derive(Debug, Clone)]
pub struct HandlerError {
    pub message: String,
    /// Skip remaining attempts
    pub unrecoverable: bool,
}

impl HandlerError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            unrecoverable: false,
        }
    }
    
    pub fn unrecoverable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            unrecoverable: true,
        }
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {}

/// Processes one claimed job
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job, progress: ProgressReporter) -> std::result::Result<JobResult, HandlerError>;
    
    /// Called after a timed-out attempt is recorded. `job` is the updated record: `Delayed`
    /// when another attempt follows, `Failed` when none does. `progress` holds the last
    /// stage the attempt reported.
    async fn on_timeout(&self, _job: &Job, _reason: &str) {}
}

/// Records progress on the job and forwards it to subscribers
#[derive(Clone)]
pub struct ProgressReporter {
    queue: Arc<dyn JobQueue>,
    events: broadcast::Sender<JobEvent>,
    job_id: String,
    meeting_id: String,
}

impl ProgressReporter {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        events: broadcast::Sender<JobEvent>,
        job: &Job,
    ) -> Self {
        Self {
            queue,
            events,
            job_id: job.id.clone(),
            meeting_id: job.meeting_id().to_string(),
        }
    }
    
    /// Progress is best-effort; failures are logged, never raised
    pub async fn report(&self, progress: ProgressEvent) {
        if let Err(e) = self.queue.update_progress(&self.job_id, progress.clone()).await {
            tracing::warn!(job_id = %self.job_id, error = %e, "Failed to record job progress");
        }
        let _ = self.events.send(JobEvent::Progress {
            job_id: self.job_id.clone(),
            meeting_id: self.meeting_id.clone(),
            progress,
        });
    }
}

pub struct Worker {
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    config: WorkerConfig,
    events: broadcast::Sender<JobEvent>,
}

impl Worker {
    pub fn new(queue: Arc<dyn JobQueue>, handler: Arc<dyn JobHandler>, config: WorkerConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            queue,
            handler,
            config,
            events,
        }
    }
    
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }
    
    /// Sender side of the event stream, for bridging to other sinks
    pub fn events(&self) -> broadcast::Sender<JobEvent> {
        self.events.clone()
    }
    
    /// Claim and process jobs until `shutdown` flips to `true`, then wait for
    /// in-flight jobs to finish.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let concurrency = self.config.concurrency.max(1);
        let slots = Arc::new(Semaphore::new(concurrency));
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut stalled_check =
            tokio::time::interval(Duration::from_millis(self.config.stalled_check_interval_ms.max(1)));
        
        tracing::info!(concurrency, "Worker started");
        
        loop {
            if *shutdown.borrow() {
                break;
            }
            
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = stalled_check.tick() => self.recover_stalled().await,
                permit = slots.clone().acquire_owned() => {
                    let Ok(permit) = permit else { break };
                    
                    match self.queue.claim_next().await {
                        Ok(Some(job)) => {
                            let queue = Arc::clone(&self.queue);
                            let handler = Arc::clone(&self.handler);
                            let events = self.events.clone();
                            tokio::spawn(async move {
                                process_job(queue, handler, events, job).await;
                                drop(permit);
                            });
                        }
                        Ok(None) => {
                            drop(permit);
                            idle(poll_interval, &mut shutdown).await;
                        }
                        Err(e) => {
                            drop(permit);
                            tracing::warn!(error = %e, "Failed to claim next job");
                            idle(poll_interval, &mut shutdown).await;
                        }
                    }
                }
            }
        }
        
        tracing::info!("Worker shutting down, waiting for in-flight jobs");
        let _ = slots.acquire_many(concurrency as u32).await;
        tracing::info!("Worker stopped");
        Ok(())
    }
    
    async fn recover_stalled(&self) {
        match self.queue.recover_stalled().await {
            Ok(jobs) => {
                for job in jobs {
                    tracing::warn!(job_id = %job.id, meeting_id = %job.meeting_id(), "Recovered stalled job");
                    let _ = self.events.send(failed_event(&job));
                }
            }
            Err(e) => tracing::warn!(error = %e, "Stalled job check failed"),
        }
    }
}

async fn idle(interval: Duration, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        _ = tokio::time::sleep(interval) => {}
        _ = shutdown.changed() => {}
    }
}

fn failed_event(job: &Job) -> JobEvent {
    JobEvent::Failed {
        job_id: job.id.clone(),
        meeting_id: job.meeting_id().to_string(),
        error: job.failed_reason.clone().unwrap_or_default(),
        will_retry: job.state == JobState::Delayed,
    }
}

async fn process_job(
    queue: Arc<dyn JobQueue>,
    handler: Arc<dyn JobHandler>,
    events: broadcast::Sender<JobEvent>,
    job: Job,
) {
    let started = std::time::Instant::now();
    tracing::info!(
        job_id = %job.id,
        meeting_id = %job.meeting_id(),
        attempt = job.attempts_made,
        "Processing job"
    );
    
    let reporter = ProgressReporter::new(Arc::clone(&queue), events.clone(), &job);
    let outcome = tokio::time::timeout(job.timeout(), handler.handle(&job, reporter)).await;
    
    let recorded = match outcome {
        Ok(Ok(result)) => {
            tracing::info!(
                job_id = %job.id,
                summary_id = %result.summary_id,
                version = result.version,
                duration_ms = started.elapsed().as_millis() as u64,
                "Job completed"
            );
            queue.complete(&job.id, result.clone()).await.map(|_| JobEvent::Completed {
                job_id: job.id.clone(),
                meeting_id: job.meeting_id().to_string(),
                result,
            })
        }
        Ok(Err(e)) => {
            tracing::error!(job_id = %job.id, error = %e.message, unrecoverable = e.unrecoverable, "Job failed");
            queue
                .fail(&job.id, &e.message, e.unrecoverable)
                .await
                .map(|failed| failed_event(&failed))
        }
        Err(_) => {
            let reason = format!("job timed out after {}ms", job.timeout_ms);
            tracing::error!(job_id = %job.id, "{}", reason);
            match queue.fail(&job.id, &reason, false).await {
                Ok(failed) => {
                    handler.on_timeout(&failed, &reason).await;
                    Ok(failed_event(&failed))
                }
                Err(e) => Err(e),
            }
        }
    };
    
    match recorded {
        Ok(event) => {
            let _ = events.send(event);
        }
        Err(e) => tracing::error!(job_id = %job.id, error = %e, "Failed to record job outcome"),
    }
}
