// Bridges queue jobs to the summarization pipeline

use async_trait::async_trait;
use recap_pipeline::{JobContext, Pipeline, ProgressSink};
use recap_queue::{HandlerError, Job, JobHandler, ProgressReporter};
use recap_types::{JobResult, PipelineStage, ProgressEvent};
use std::sync::Arc;

pub struct PipelineJobHandler {
    pipeline: Arc<Pipeline>,
}

impl PipelineJobHandler {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

struct ReporterSink(ProgressReporter);

#[async_trait]
impl ProgressSink for ReporterSink {
    async fn report(&self, event: ProgressEvent) {
        self.0.report(event).await;
    }
}

#[async_trait]
impl JobHandler for PipelineJobHandler {
    async fn handle(&self, job: &Job, progress: ProgressReporter) -> Result<JobResult, HandlerError> {
        let ctx = JobContext::new(&job.id, job.payload.clone()).with_attempt(job.attempts_made);
        
        self.pipeline
            .run(&ctx, &ReporterSink(progress))
            .await
            .map_err(|e| {
                if e.is_unrecoverable() {
                    HandlerError::unrecoverable(e.to_string())
                } else {
                    HandlerError::retryable(e.to_string())
                }
            })
    }
    
    async fn on_timeout(&self, job: &Job, reason: &str) {
        let ctx = JobContext::new(&job.id, job.payload.clone()).with_attempt(job.attempts_made);
        let stage = job
            .progress
            .as_ref()
            .map(|p| p.stage)
            .unwrap_or(PipelineStage::Retrieve);
        self.pipeline.record_timeout(&ctx, stage, reason).await;
    }
}
