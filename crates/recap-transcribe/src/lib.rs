pub mod types;
pub mod traits;
pub mod error;
pub mod config;
pub mod none;
pub mod whisper;
pub mod diarization;

pub use traits::Transcriber;
pub use types::{AudioSource, Segment, TranscriptionOutput, TranscriptionProvider};
pub use error::{TranscribeError, Result};
pub use config::{create_transcriber, DiarizationConfig, TranscriptionConfig, WhisperConfig};
pub use none::NoopTranscriber;
pub use whisper::WhisperClient;
pub use diarization::DiarizationClient;
