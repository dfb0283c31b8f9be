// Runs one summarization job through every stage and records each transition

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use recap_llm::{ChatClient, TokenUsage};
use recap_persist::PersistenceClient;
use recap_transcribe::{NoopTranscriber, Transcriber};
use recap_types::{
    new_id, ActionItem, ActionItemStatus, GenerationMetadata, JobPayload, JobResult, Meeting,
    PipelineStage, ProcessingLog, ProcessingStatus, ProgressEvent, SourceType, StageStatus,
    Summary, SummaryReason,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::context::ContextBuilder;
use crate::download::Downloader;
use crate::error::{PipelineError, Result};
use crate::extract::AttachmentExtractor;
use crate::format::FormattedSummary;
use crate::progress::ProgressSink;
use crate::prompt::PROMPT_VERSION;
use crate::stages::{SummarizationStage, TranscriptionStage};

/// What the pipeline needs to know about the job it is running
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: String,
    /// 1-based attempt number
    pub attempt: u32,
    pub payload: JobPayload,
}

impl JobContext {
    pub fn new(job_id: impl Into<String>, payload: JobPayload) -> Self {
        Self {
            job_id: job_id.into(),
            attempt: 1,
            payload,
        }
    }
    
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt.max(1);
        self
    }
    
    pub fn meeting_id(&self) -> &str {
        &self.payload.meeting_id
    }
    
    fn reason(&self) -> SummaryReason {
        if self.payload.regenerate {
            SummaryReason::RegeneratedByPm
        } else if self.attempt > 1 {
            SummaryReason::Retry
        } else {
            SummaryReason::Initial
        }
    }
}

struct StageTimer {
    stage: PipelineStage,
    started_at: DateTime<Utc>,
    clock: Instant,
}

pub struct Pipeline {
    store: Arc<dyn PersistenceClient>,
    transcription: TranscriptionStage,
    context: ContextBuilder,
    summarization: SummarizationStage,
    default_language: String,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }
    
    /// Run the job end to end. On failure the meeting is marked `failed`, an
    /// error row is logged and the error is returned for the queue to classify.
    pub async fn run(&self, ctx: &JobContext, progress: &dyn ProgressSink) -> Result<JobResult> {
        let mut stage = PipelineStage::Retrieve;
        let started = Instant::now();
        
        match self.execute(ctx, progress, &mut stage).await {
            Ok(result) => {
                info!(
                    job_id = %ctx.job_id,
                    meeting_id = %ctx.meeting_id(),
                    summary_id = %result.summary_id,
                    version = result.version,
                    action_items = result.action_items_created,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Summarization job completed"
                );
                Ok(result)
            }
            Err(e) => {
                self.record_failure(ctx, stage, &e).await;
                Err(e)
            }
        }
    }
    
    async fn execute(
        &self,
        ctx: &JobContext,
        progress: &dyn ProgressSink,
        stage: &mut PipelineStage,
    ) -> Result<JobResult> {
        let meeting_id = ctx.meeting_id();
        
        // RETRIEVE
        *stage = PipelineStage::Retrieve;
        let timer = self.begin(ctx, progress, *stage, "Loading meeting and transcript").await;
        let meeting = self
            .store
            .get_meeting(meeting_id)
            .await?
            .ok_or_else(|| PipelineError::MeetingNotFound(meeting_id.to_string()))?;
        self.store
            .set_processing_status(meeting_id, ProcessingStatus::Processing, Some(&ctx.job_id))
            .await?;
        let transcript = self.transcription.ensure_transcript(&meeting).await?;
        self.finish(
            ctx,
            timer,
            None,
            json!({
                "transcriptId": transcript.transcript.id,
                "transcriptStatus": transcript.transcript.status,
                "reused": transcript.reused,
            }),
        )
        .await;
        
        // MERGE
        *stage = PipelineStage::Merge;
        let timer = self.begin(ctx, progress, *stage, "Merging transcript, chat and attachments").await;
        let usable = transcript.transcript.is_usable().then_some(&transcript.transcript);
        let context = self.context.build(&meeting, usable).await;
        self.finish(
            ctx,
            timer,
            None,
            json!({
                "chars": context.document.chars().count(),
                "transcriptChars": context.transcript_chars,
                "chatMessages": context.chat_messages,
                "attachments": context.attachments,
                "truncated": context.truncated,
            }),
        )
        .await;
        
        // SUMMARIZE
        *stage = PipelineStage::Summarize;
        let timer = self.begin(ctx, progress, *stage, "Generating summary").await;
        let language = self.language_for(&meeting);
        let output = self.summarization.summarize(&context.document, language).await?;
        self.finish(
            ctx,
            timer,
            output.usage,
            json!({
                "model": output.model,
                "attempts": output.attempts,
                "parse": output.outcome.kind(),
            }),
        )
        .await;
        
        // FORMAT
        *stage = PipelineStage::Format;
        let timer = self.begin(ctx, progress, *stage, "Validating model output").await;
        let formatted = FormattedSummary::from_outcome(&output.outcome);
        let quality = formatted.quality(&output.outcome, Utc::now());
        self.finish(
            ctx,
            timer,
            None,
            json!({
                "populatedFields": formatted.populated_fields(),
                "confidence": quality.confidence,
                "actionItems": formatted.action_items.len(),
            }),
        )
        .await;
        
        // SAVE
        *stage = PipelineStage::Save;
        let timer = self.begin(ctx, progress, *stage, "Saving summary and action items").await;
        let now = Utc::now();
        let summary = Summary {
            id: new_id(),
            meeting_id: meeting_id.to_string(),
            transcript_id: Some(transcript.transcript.id.clone()),
            version: 0,
            is_latest: true,
            reason: ctx.reason(),
            overview: formatted.overview,
            sections: formatted.sections,
            action_items: Vec::new(),
            decisions: formatted.decisions,
            risks: formatted.risks,
            quality,
            generation: GenerationMetadata {
                provider: self.summarization.provider_name().to_string(),
                model: self.summarization.model().to_string(),
                prompt_version: PROMPT_VERSION.to_string(),
                temperature: self.summarization.temperature(),
                transcription_provider: Some(self.transcription.provider().to_string()),
            },
            created_at: now,
        };
        let summary = self.store.insert_summary_version(summary).await?;
        
        let items: Vec<ActionItem> = formatted
            .action_items
            .into_iter()
            .map(|item| ActionItem {
                id: new_id(),
                summary_id: summary.id.clone(),
                meeting_id: meeting_id.to_string(),
                name: item.name,
                description: item.description,
                due_date: item.due_date,
                priority: item.priority,
                status: ActionItemStatus::Pending,
                source_type: SourceType::AiExtracted,
                created_at: now,
            })
            .collect();
        let item_ids = if items.is_empty() {
            Vec::new()
        } else {
            let ids = self.store.insert_action_items(items).await?;
            self.store.set_summary_action_items(&summary.id, &ids).await?;
            ids
        };
        self.finish(
            ctx,
            timer,
            None,
            json!({
                "summaryId": summary.id,
                "version": summary.version,
                "reason": summary.reason,
                "actionItemsCreated": item_ids.len(),
            }),
        )
        .await;
        
        // COMPLETE
        *stage = PipelineStage::Complete;
        let timer = self.begin(ctx, progress, *stage, "Summary ready").await;
        self.store.complete_meeting(meeting_id, &summary.id).await?;
        self.finish(ctx, timer, None, json!({ "summaryId": summary.id })).await;
        
        Ok(JobResult {
            success: true,
            summary_id: summary.id,
            version: summary.version,
            action_items_created: item_ids.len(),
        })
    }
    
    fn language_for<'a>(&'a self, meeting: &'a Meeting) -> &'a str {
        meeting
            .language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.default_language)
    }
    
    async fn begin(
        &self,
        ctx: &JobContext,
        progress: &dyn ProgressSink,
        stage: PipelineStage,
        message: &str,
    ) -> StageTimer {
        info!(job_id = %ctx.job_id, meeting_id = %ctx.meeting_id(), stage = %stage, "Stage started");
        progress.report(ProgressEvent::new(stage, message)).await;
        
        let timer = StageTimer {
            stage,
            started_at: Utc::now(),
            clock: Instant::now(),
        };
        self.append_log(
            ProcessingLog::new(&ctx.job_id, ctx.meeting_id(), stage, StageStatus::Started)
                .started_at(timer.started_at),
        )
        .await;
        timer
    }
    
    async fn finish(&self, ctx: &JobContext, timer: StageTimer, tokens: Option<TokenUsage>, metadata: Value) {
        let duration_ms = timer.clock.elapsed().as_millis() as u64;
        self.append_log(
            ProcessingLog::new(&ctx.job_id, ctx.meeting_id(), timer.stage, StageStatus::Completed)
                .started_at(timer.started_at)
                .duration_ms(duration_ms)
                .tokens(tokens)
                .metadata(metadata),
        )
        .await;
    }
    
    /// Error row and failed meeting for an attempt the queue abandoned mid-stage.
    /// `stage` is the last stage the attempt reported.
    pub async fn record_timeout(&self, ctx: &JobContext, stage: PipelineStage, reason: &str) {
        self.record_failure(ctx, stage, &PipelineError::TimedOut(reason.to_string()))
            .await;
    }
    
    async fn record_failure(&self, ctx: &JobContext, stage: PipelineStage, err: &PipelineError) {
        error!(
            job_id = %ctx.job_id,
            meeting_id = %ctx.meeting_id(),
            stage = %stage,
            attempt = ctx.attempt,
            unrecoverable = err.is_unrecoverable(),
            error = %err,
            "Summarization job failed"
        );
        
        self.append_log(
            ProcessingLog::new(&ctx.job_id, ctx.meeting_id(), PipelineStage::Error, StageStatus::Failed)
                .error(err.to_string(), err.error_stack())
                .metadata(json!({
                    "stage": stage,
                    "attempt": ctx.attempt,
                    "unrecoverable": err.is_unrecoverable(),
                })),
        )
        .await;
        
        if let Err(e) = self
            .store
            .set_processing_status(ctx.meeting_id(), ProcessingStatus::Failed, Some(&ctx.job_id))
            .await
        {
            warn!(meeting_id = %ctx.meeting_id(), error = %e, "Could not mark meeting failed");
        }
    }
    
    /// Audit rows never fail the job
    async fn append_log(&self, log: ProcessingLog) {
        let stage = log.stage;
        if let Err(e) = self.store.append_processing_log(log).await {
            warn!(stage = %stage, error = %e, "Failed to write processing log");
        }
    }
}

pub struct PipelineBuilder {
    store: Option<Arc<dyn PersistenceClient>>,
    chat_client: Option<Arc<dyn ChatClient>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            chat_client: None,
            transcriber: None,
            config: PipelineConfig::default(),
        }
    }
    
    pub fn store(mut self, store: Arc<dyn PersistenceClient>) -> Self {
        self.store = Some(store);
        self
    }
    
    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }
    
    /// Defaults to the disabled provider when unset
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }
    
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }
    
    pub fn build(self) -> Result<Pipeline> {
        let store = self
            .store
            .ok_or_else(|| PipelineError::Config("store is required".to_string()))?;
        let chat_client = self
            .chat_client
            .ok_or_else(|| PipelineError::Config("chat client is required".to_string()))?;
        let transcriber = self.transcriber.unwrap_or_else(|| Arc::new(NoopTranscriber));
        let config = self.config;
        
        let media_downloader = Downloader::new(config.download_timeout())?;
        let attachment_downloader =
            Downloader::new(Duration::from_secs(config.attachments.request_timeout_secs))?;
        
        let transcription = TranscriptionStage::new(
            store.clone(),
            transcriber,
            media_downloader.clone(),
            config.max_video_bytes,
            config.temp_dir.clone(),
            config.default_language.clone(),
        );
        let context = ContextBuilder::new(
            media_downloader,
            AttachmentExtractor::new(attachment_downloader, config.attachments.clone()),
            &config,
        );
        let summarization = SummarizationStage::new(
            chat_client,
            config.model.clone(),
            config.temperature,
            config.max_tokens,
            config.summarize_retry_policy(),
        );
        
        Ok(Pipeline {
            store,
            transcription,
            context,
            summarization,
            default_language: config.default_language,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
