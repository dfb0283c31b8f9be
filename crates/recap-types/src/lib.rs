pub mod meeting;
pub mod transcript;
pub mod summary;
pub mod action_item;
pub mod processing_log;
pub mod job;

pub use meeting::{Attachment, Meeting, ProcessingStatus};
pub use transcript::{Transcript, TranscriptSegment, TranscriptStatus};
pub use summary::{
    Decision, GenerationMetadata, QualityConfidence, Risk, Severity, Summary, SummaryQuality,
    SummaryReason, SummarySection,
};
pub use action_item::{ActionItem, ActionItemStatus, Priority, SourceType};
pub use processing_log::{PipelineStage, ProcessingLog, StageStatus};
pub use job::{JobOptions, JobPayload, JobResult, ProgressEvent};

/// Generate a new document identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
