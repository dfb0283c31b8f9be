pub mod transcription;
pub mod summarization;

pub use transcription::{TranscriptOutcome, TranscriptionStage};
pub use summarization::{SummarizationOutput, SummarizationStage};
