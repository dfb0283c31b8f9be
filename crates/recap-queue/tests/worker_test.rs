use async_trait::async_trait;
use recap_queue::{
    HandlerError, InMemoryQueue, Job, JobEvent, JobHandler, JobQueue, JobSettings, JobState,
    ProgressReporter, Worker, WorkerConfig,
};
use recap_types::{JobPayload, JobResult, PipelineStage, ProgressEvent};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

fn config() -> WorkerConfig {
    WorkerConfig {
        concurrency: 2,
        poll_interval_ms: 5,
        stalled_check_interval_ms: 1_000,
    }
}

fn ok_result(job: &Job) -> JobResult {
    JobResult {
        success: true,
        summary_id: format!("summary-{}", job.meeting_id()),
        version: job.attempts_made,
        action_items_created: 1,
    }
}

/// Fails the first `failures` calls, then succeeds
struct FlakyHandler {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait]
impl JobHandler for FlakyHandler {
    async fn handle(&self, job: &Job, progress: ProgressReporter) -> Result<JobResult, HandlerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        progress
            .report(ProgressEvent::new(PipelineStage::Retrieve, "Loading meeting"))
            .await;
        if call <= self.failures {
            return Err(HandlerError::retryable("connection reset"));
        }
        Ok(ok_result(job))
    }
}

struct FatalHandler;

#[async_trait]
impl JobHandler for FatalHandler {
    async fn handle(&self, _job: &Job, _progress: ProgressReporter) -> Result<JobResult, HandlerError> {
        Err(HandlerError::unrecoverable("meeting has no video and no transcript"))
    }
}

/// Stalls past the job timeout and records every timeout notification
#[derive(Default)]
struct SlowHandler {
    timeouts: Mutex<Vec<(JobState, Option<PipelineStage>, String)>>,
}

#[async_trait]
impl JobHandler for SlowHandler {
    async fn handle(&self, job: &Job, progress: ProgressReporter) -> Result<JobResult, HandlerError> {
        progress
            .report(ProgressEvent::new(PipelineStage::Summarize, "Generating summary"))
            .await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(ok_result(job))
    }

    async fn on_timeout(&self, job: &Job, reason: &str) {
        self.timeouts.lock().unwrap().push((
            job.state,
            job.progress.as_ref().map(|p| p.stage),
            reason.to_string(),
        ));
    }
}

async fn wait_for_state(queue: &InMemoryQueue, job_id: &str, state: JobState) -> Job {
    for _ in 0..200 {
        let job = queue.get_job(job_id).await.unwrap().unwrap();
        if job.state == state {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached {state}");
}

fn build_worker(queue: Arc<InMemoryQueue>, handler: Arc<dyn JobHandler>) -> (Worker, watch::Sender<bool>) {
    let worker = Worker::new(queue, handler, config());
    let (tx, _rx) = watch::channel(false);
    (worker, tx)
}

#[tokio::test]
async fn test_worker_completes_job_and_publishes_events() {
    let queue = Arc::new(InMemoryQueue::new(JobSettings::default()));
    let handler = Arc::new(FlakyHandler {
        failures: 0,
        calls: AtomicU32::new(0),
    });
    let (worker, shutdown) = build_worker(queue.clone(), handler);
    let mut events = worker.subscribe();
    let job = queue.enqueue(JobPayload::new("m1")).await.unwrap();

    let worker = Arc::new(worker);
    let running = {
        let worker = worker.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move { worker.run(rx).await })
    };

    let done = wait_for_state(&queue, &job.id, JobState::Completed).await;
    assert_eq!(done.result.unwrap().summary_id, "summary-m1");

    let first = events.recv().await.unwrap();
    assert!(matches!(first, JobEvent::Progress { .. }));
    let second = events.recv().await.unwrap();
    match second {
        JobEvent::Completed { job_id, result, .. } => {
            assert_eq!(job_id, job.id);
            assert_eq!(result.version, 1);
        }
        other => panic!("unexpected event {other:?}"),
    }

    shutdown.send(true).unwrap();
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_worker_retries_transient_failures() {
    let queue = Arc::new(InMemoryQueue::new(JobSettings {
        max_attempts: 3,
        backoff_ms: 10,
        timeout_ms: 5_000,
    }));
    let handler = Arc::new(FlakyHandler {
        failures: 2,
        calls: AtomicU32::new(0),
    });
    let (worker, shutdown) = build_worker(queue.clone(), handler.clone());
    let job = queue.enqueue(JobPayload::new("m1")).await.unwrap();

    let worker = Arc::new(worker);
    let running = {
        let worker = worker.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move { worker.run(rx).await })
    };

    let done = wait_for_state(&queue, &job.id, JobState::Completed).await;
    assert_eq!(done.attempts_made, 3);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 3);

    shutdown.send(true).unwrap();
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_worker_does_not_retry_unrecoverable_failures() {
    let queue = Arc::new(InMemoryQueue::new(JobSettings {
        max_attempts: 3,
        backoff_ms: 10,
        timeout_ms: 5_000,
    }));
    let (worker, shutdown) = build_worker(queue.clone(), Arc::new(FatalHandler));
    let mut events = worker.subscribe();
    let job = queue.enqueue(JobPayload::new("m1")).await.unwrap();

    let worker = Arc::new(worker);
    let running = {
        let worker = worker.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move { worker.run(rx).await })
    };

    let failed = wait_for_state(&queue, &job.id, JobState::Failed).await;
    assert_eq!(failed.attempts_made, 1);
    match events.recv().await.unwrap() {
        JobEvent::Failed { will_retry, error, .. } => {
            assert!(!will_retry);
            assert!(error.contains("no video"));
        }
        other => panic!("unexpected event {other:?}"),
    }

    shutdown.send(true).unwrap();
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_worker_times_out_long_jobs() {
    let queue = Arc::new(InMemoryQueue::new(JobSettings {
        max_attempts: 1,
        backoff_ms: 10,
        timeout_ms: 50,
    }));
    let handler = Arc::new(SlowHandler::default());
    let (worker, shutdown) = build_worker(queue.clone(), handler.clone());
    let job = queue.enqueue(JobPayload::new("m1")).await.unwrap();

    let worker = Arc::new(worker);
    let running = {
        let worker = worker.clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move { worker.run(rx).await })
    };

    let failed = wait_for_state(&queue, &job.id, JobState::Failed).await;
    assert!(failed.failed_reason.unwrap().contains("timed out"));

    for _ in 0..100 {
        if !handler.timeouts.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let timeouts = handler.timeouts.lock().unwrap().clone();
    assert_eq!(timeouts.len(), 1);
    let (state, stage, reason) = &timeouts[0];
    assert_eq!(*state, JobState::Failed);
    assert_eq!(*stage, Some(PipelineStage::Summarize));
    assert!(reason.contains("timed out"));

    shutdown.send(true).unwrap();
    running.await.unwrap().unwrap();
}
