pub mod error;
pub mod config;
pub mod retry;
pub mod download;
pub mod extract;
pub mod chat_history;
pub mod context;
pub mod prompt;
pub mod parse;
pub mod format;
pub mod progress;
pub mod stages;
pub mod orchestrator;

mod text;

pub use error::{PipelineError, Result};
pub use config::{AttachmentLimits, PipelineConfig};
pub use retry::{Retryable, RetryPolicy};
pub use download::{DownloadError, Downloader};
pub use extract::{AttachmentExtractor, ExtractedAttachment, ExtractorRegistry, TextExtractor};
pub use chat_history::ChatMessage;
pub use context::{ContextBuilder, MergedContext};
pub use parse::{parse_model_output, ParseOutcome};
pub use format::{ExtractedActionItem, FormattedSummary};
pub use progress::{ChannelProgress, NoopProgress, ProgressSink};
pub use stages::{SummarizationOutput, SummarizationStage, TranscriptOutcome, TranscriptionStage};
pub use orchestrator::{JobContext, Pipeline, PipelineBuilder};
