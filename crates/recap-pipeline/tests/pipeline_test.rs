mod common;

use std::sync::Arc;

use common::{build_pipeline, fast_config, FakeChatClient, FakeTranscriber};
use recap_llm::LlmError;
use recap_persist::{InMemoryPersistence, PersistenceClient};
use recap_pipeline::{ChannelProgress, JobContext, NoopProgress, PipelineError};
use recap_types::{
    ActionItemStatus, Attachment, JobPayload, Meeting, PipelineStage, Priority, ProcessingStatus,
    QualityConfidence, SourceType, StageStatus, SummaryReason,
};

const M1_SUMMARY: &str = r#"{
  "overview": "The team agreed to ship the release on Friday.",
  "sections": [{"title": "Release", "content": "Ship it Friday"}],
  "actionItems": [{"title": "Ship the release", "description": "Cut the build and publish", "dueDate": "2026-10-23", "priority": "high"}],
  "decisions": [{"title": "Release ships Friday"}],
  "risks": []
}"#;

struct Harness {
    server: mockito::ServerGuard,
    store: Arc<InMemoryPersistence>,
    temp: tempfile::TempDir,
}

impl Harness {
    async fn new() -> Self {
        Self {
            server: mockito::Server::new_async().await,
            store: Arc::new(InMemoryPersistence::new()),
            temp: tempfile::tempdir().unwrap(),
        }
    }
    
    async fn serve_video(&mut self, bytes: usize) -> String {
        self.server
            .mock("GET", "/video.mp4")
            .with_status(200)
            .with_header("content-type", "video/mp4")
            .with_body(vec![7u8; bytes])
            .create_async()
            .await;
        format!("{}/video.mp4", self.server.url())
    }
    
    async fn seed(&self, meeting: Meeting) {
        self.store.insert_meeting(meeting).await;
    }
    
    fn temp_files(&self) -> usize {
        std::fs::read_dir(self.temp.path()).unwrap().count()
    }
}

#[tokio::test]
async fn test_first_run_end_to_end() {
    let mut h = Harness::new().await;
    let video = h.serve_video(1024).await;
    h.server
        .mock("GET", "/chat.json")
        .with_status(200)
        .with_body(r#"[{"sender": "Ana", "text": "ship it Friday"}]"#)
        .create_async()
        .await;
    let chat_url = format!("{}/chat.json", h.server.url());
    h.seed(Meeting::new("M1").with_title("Release sync").with_video(video).with_chat_history(chat_url))
        .await;

    let chat = Arc::new(FakeChatClient::answering(M1_SUMMARY));
    let transcriber = Arc::new(FakeTranscriber::new("Okay, we ship it Friday."));
    let pipeline = build_pipeline(h.store.clone(), chat.clone(), transcriber.clone(), fast_config(h.temp.path()));
    let (progress, mut events) = ChannelProgress::new();

    let result = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M1")), &progress)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.version, 1);
    assert_eq!(result.action_items_created, 1);

    let meeting = h.store.get_meeting("M1").await.unwrap().unwrap();
    assert_eq!(meeting.processing_status, ProcessingStatus::Completed);
    assert_eq!(meeting.summary_id.as_deref(), Some(result.summary_id.as_str()));
    assert_eq!(meeting.summary_history, vec![result.summary_id.clone()]);
    assert_eq!(meeting.last_job_id.as_deref(), Some("job-1"));
    assert!(meeting.transcript_id.is_some());

    let summaries = h.store.list_summaries("M1").await.unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert!(summary.is_latest);
    assert_eq!(summary.reason, SummaryReason::Initial);
    assert_eq!(summary.quality.confidence, QualityConfidence::High);
    assert_eq!(summary.generation.provider, "fake");
    assert_eq!(summary.generation.transcription_provider.as_deref(), Some("whisper"));

    let items = h.store.list_action_items(&summary.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].priority, Priority::High);
    assert_eq!(items[0].source_type, SourceType::AiExtracted);
    assert_eq!(items[0].status, ActionItemStatus::Pending);
    assert_eq!(summary.action_items, vec![items[0].id.clone()]);

    let prompt = chat.last_user_message();
    assert!(prompt.contains("Okay, we ship it Friday."));
    assert!(prompt.contains("Ana: ship it Friday"));
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(h.temp_files(), 0);

    let mut percentages = Vec::new();
    while let Ok(event) = events.try_recv() {
        percentages.push(event.percentage);
    }
    assert_eq!(percentages, vec![10, 30, 50, 75, 90, 100]);

    let logs = h.store.list_processing_logs("job-1").await.unwrap();
    let completed: Vec<PipelineStage> = logs
        .iter()
        .filter(|l| l.status == StageStatus::Completed)
        .map(|l| l.stage)
        .collect();
    assert_eq!(
        completed,
        vec![
            PipelineStage::Retrieve,
            PipelineStage::Merge,
            PipelineStage::Summarize,
            PipelineStage::Format,
            PipelineStage::Save,
            PipelineStage::Complete,
        ]
    );
    let summarize = logs
        .iter()
        .find(|l| l.stage == PipelineStage::Summarize && l.status == StageStatus::Completed)
        .unwrap();
    assert_eq!(summarize.tokens.map(|t| t.total_tokens), Some(200));
}

#[tokio::test]
async fn test_regeneration_adds_a_version_and_reuses_transcript() {
    let mut h = Harness::new().await;
    let video = h.serve_video(512).await;
    h.seed(Meeting::new("M2").with_video(video)).await;

    let chat = Arc::new(FakeChatClient::answering(M1_SUMMARY));
    let transcriber = Arc::new(FakeTranscriber::new("status update"));
    let pipeline = build_pipeline(h.store.clone(), chat.clone(), transcriber.clone(), fast_config(h.temp.path()));

    pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M2")), &NoopProgress)
        .await
        .unwrap();
    let second = pipeline
        .run(&JobContext::new("job-2", JobPayload::new("M2").regenerate(true)), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(second.version, 2);
    let summaries = h.store.list_summaries("M2").await.unwrap();
    assert_eq!(summaries.iter().map(|s| s.version).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(summaries.iter().filter(|s| s.is_latest).count(), 1);
    assert!(summaries[1].is_latest);
    assert_eq!(summaries[1].reason, SummaryReason::RegeneratedByPm);

    // the completed transcript from the first run is reused
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(h.store.list_transcripts("M2").await.unwrap().len(), 1);

    let meeting = h.store.get_meeting("M2").await.unwrap().unwrap();
    assert_eq!(meeting.summary_history.len(), 2);
    assert_eq!(meeting.summary_id.as_deref(), Some(second.summary_id.as_str()));
}

#[tokio::test]
async fn test_missing_risks_default_to_empty() {
    let mut h = Harness::new().await;
    let video = h.serve_video(128).await;
    h.seed(Meeting::new("M3").with_video(video)).await;

    let chat = Arc::new(FakeChatClient::answering(r#"{"overview": "Quick sync", "sections": [], "actionItems": [], "decisions": []}"#));
    let pipeline = build_pipeline(
        h.store.clone(),
        chat,
        Arc::new(FakeTranscriber::new("quick sync")),
        fast_config(h.temp.path()),
    );

    let result = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M3")), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.action_items_created, 0);
    let summary = h.store.latest_summary("M3").await.unwrap().unwrap();
    assert!(summary.risks.is_empty());
    assert_eq!(summary.overview, "Quick sync");
}

#[tokio::test]
async fn test_non_json_output_completes_with_empty_summary() {
    let mut h = Harness::new().await;
    let video = h.serve_video(128).await;
    h.seed(Meeting::new("M4").with_video(video)).await;

    let pipeline = build_pipeline(
        h.store.clone(),
        Arc::new(FakeChatClient::answering("Sorry, I cannot summarize this meeting.")),
        Arc::new(FakeTranscriber::new("hello")),
        fast_config(h.temp.path()),
    );

    let result = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M4")), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.version, 1);
    let summary = h.store.latest_summary("M4").await.unwrap().unwrap();
    assert!(summary.overview.is_empty());
    assert!(summary.sections.is_empty());
    assert!(summary.action_items.is_empty());
    assert!(summary.decisions.is_empty());
    assert!(summary.risks.is_empty());
    assert_eq!(summary.quality.confidence, QualityConfidence::Low);
    assert_eq!(summary.quality.score, 0.0);
}

#[tokio::test]
async fn test_connection_errors_exhaust_attempts() {
    let mut h = Harness::new().await;
    let video = h.serve_video(128).await;
    h.seed(Meeting::new("M5").with_video(video)).await;

    let chat = Arc::new(FakeChatClient::scripted(vec![
        Err(LlmError::Connection("connection reset by peer".into())),
        Err(LlmError::Connection("connection reset by peer".into())),
        Err(LlmError::Connection("connection reset by peer".into())),
    ]));
    let pipeline = build_pipeline(
        h.store.clone(),
        chat.clone(),
        Arc::new(FakeTranscriber::new("hello")),
        fast_config(h.temp.path()),
    );

    let err = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M5")), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Llm(LlmError::Connection(_))));
    assert!(!err.is_unrecoverable());
    assert_eq!(chat.calls(), 3);

    let meeting = h.store.get_meeting("M5").await.unwrap().unwrap();
    assert_eq!(meeting.processing_status, ProcessingStatus::Failed);
    assert!(h.store.list_summaries("M5").await.unwrap().is_empty());

    let logs = h.store.list_processing_logs("job-1").await.unwrap();
    let error_row = logs.iter().find(|l| l.stage == PipelineStage::Error).unwrap();
    assert_eq!(error_row.status, StageStatus::Failed);
    assert_eq!(error_row.metadata["stage"], "summarize");
    assert!(error_row
        .error_stack
        .as_deref()
        .unwrap()
        .contains("caused by: Connection error"));
}

#[tokio::test]
async fn test_auth_error_is_not_retried() {
    let mut h = Harness::new().await;
    let video = h.serve_video(128).await;
    h.seed(Meeting::new("M6").with_video(video)).await;

    let chat = Arc::new(FakeChatClient::scripted(vec![Err(LlmError::Auth {
        status: 401,
        body: "invalid api key".into(),
    })]));
    let pipeline = build_pipeline(
        h.store.clone(),
        chat.clone(),
        Arc::new(FakeTranscriber::new("hello")),
        fast_config(h.temp.path()),
    );

    let err = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M6")), &NoopProgress)
        .await
        .unwrap_err();

    assert!(err.is_unrecoverable());
    assert_eq!(chat.calls(), 1);
}

#[tokio::test]
async fn test_oversized_video_fails_before_transcription() {
    let mut h = Harness::new().await;
    let video = h.serve_video(4096).await;
    h.seed(Meeting::new("M7").with_video(video)).await;

    let transcriber = Arc::new(FakeTranscriber::new("never"));
    let config = recap_pipeline::PipelineConfig {
        max_video_bytes: 1024,
        ..fast_config(h.temp.path())
    };
    let chat = Arc::new(FakeChatClient::answering(M1_SUMMARY));
    let pipeline = build_pipeline(h.store.clone(), chat.clone(), transcriber.clone(), config);

    let err = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M7")), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Download(_)));
    assert!(err.is_unrecoverable());
    assert_eq!(transcriber.calls(), 0);
    assert_eq!(chat.calls(), 0);
    assert_eq!(h.temp_files(), 0);

    let transcripts = h.store.list_transcripts("M7").await.unwrap();
    assert_eq!(transcripts.len(), 1);
    assert_eq!(transcripts[0].status, recap_types::TranscriptStatus::Failed);
    assert!(transcripts[0].error.is_some());
}

#[tokio::test]
async fn test_meeting_without_video_is_unrecoverable() {
    let h = Harness::new().await;
    h.seed(Meeting::new("M8").with_title("No recording")).await;

    let chat = Arc::new(FakeChatClient::answering(M1_SUMMARY));
    let pipeline = build_pipeline(
        h.store.clone(),
        chat.clone(),
        Arc::new(FakeTranscriber::new("never")),
        fast_config(h.temp.path()),
    );

    let err = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M8")), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingMedia(_)));
    assert!(err.is_unrecoverable());
    assert_eq!(chat.calls(), 0);
    assert!(h.store.list_transcripts("M8").await.unwrap().is_empty());
    let meeting = h.store.get_meeting("M8").await.unwrap().unwrap();
    assert_eq!(meeting.processing_status, ProcessingStatus::Failed);
}

#[tokio::test]
async fn test_unknown_meeting_is_unrecoverable() {
    let h = Harness::new().await;
    let pipeline = build_pipeline(
        h.store.clone(),
        Arc::new(FakeChatClient::answering(M1_SUMMARY)),
        Arc::new(FakeTranscriber::new("never")),
        fast_config(h.temp.path()),
    );

    let err = pipeline
        .run(&JobContext::new("job-1", JobPayload::new("missing")), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MeetingNotFound(_)));
    assert!(err.is_unrecoverable());
}

#[tokio::test]
async fn test_oversized_attachment_is_skipped() {
    let mut h = Harness::new().await;
    let video = h.serve_video(128).await;
    h.server
        .mock("GET", "/big.txt")
        .with_status(200)
        .with_body("B".repeat(5000))
        .create_async()
        .await;
    h.server
        .mock("GET", "/notes.txt")
        .with_status(200)
        .with_body("budget approved")
        .create_async()
        .await;
    let base = h.server.url();
    h.seed(
        Meeting::new("M9")
            .with_video(video)
            .with_attachment(Attachment::new("big.txt", format!("{}/big.txt", base)))
            .with_attachment(Attachment::new("notes.txt", format!("{}/notes.txt", base))),
    )
    .await;

    let mut config = fast_config(h.temp.path());
    config.attachments.max_file_bytes = 1024;
    let chat = Arc::new(FakeChatClient::answering(M1_SUMMARY));
    let pipeline = build_pipeline(h.store.clone(), chat.clone(), Arc::new(FakeTranscriber::new("hello")), config);

    pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M9")), &NoopProgress)
        .await
        .unwrap();

    let prompt = chat.last_user_message();
    assert!(prompt.contains("## notes.txt\nbudget approved"));
    assert!(!prompt.contains("big.txt"));
}

#[tokio::test]
async fn test_retried_job_records_retry_reason() {
    let mut h = Harness::new().await;
    let video = h.serve_video(128).await;
    h.seed(Meeting::new("M10").with_video(video)).await;

    let pipeline = build_pipeline(
        h.store.clone(),
        Arc::new(FakeChatClient::answering(M1_SUMMARY)),
        Arc::new(FakeTranscriber::new("hello")),
        fast_config(h.temp.path()),
    );

    pipeline
        .run(&JobContext::new("job-1", JobPayload::new("M10")).with_attempt(2), &NoopProgress)
        .await
        .unwrap();

    let summary = h.store.latest_summary("M10").await.unwrap().unwrap();
    assert_eq!(summary.reason, SummaryReason::Retry);
}

#[tokio::test]
async fn test_abandoned_attempt_marks_meeting_failed() {
    let h = Harness::new().await;
    h.seed(Meeting::new("M11").with_video("https://cdn.example.com/m11.mp4")).await;
    h.store
        .set_processing_status("M11", ProcessingStatus::Processing, Some("job-1"))
        .await
        .unwrap();

    let pipeline = build_pipeline(
        h.store.clone(),
        Arc::new(FakeChatClient::answering(M1_SUMMARY)),
        Arc::new(FakeTranscriber::new("hello")),
        fast_config(h.temp.path()),
    );
    let ctx = JobContext::new("job-1", JobPayload::new("M11")).with_attempt(3);

    pipeline
        .record_timeout(&ctx, PipelineStage::Summarize, "job timed out after 300000ms")
        .await;

    let meeting = h.store.get_meeting("M11").await.unwrap().unwrap();
    assert_eq!(meeting.processing_status, ProcessingStatus::Failed);

    let logs = h.store.list_processing_logs("job-1").await.unwrap();
    assert_eq!(logs.len(), 1);
    let error_row = &logs[0];
    assert_eq!(error_row.stage, PipelineStage::Error);
    assert_eq!(error_row.status, StageStatus::Failed);
    assert_eq!(error_row.metadata["stage"], "summarize");
    assert_eq!(error_row.metadata["attempt"], 3);
    assert_eq!(error_row.metadata["unrecoverable"], false);
    assert!(error_row.error_message.as_deref().unwrap().contains("timed out"));
}
