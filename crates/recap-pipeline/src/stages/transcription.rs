use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use recap_persist::PersistenceClient;
use recap_transcribe::{AudioSource, Transcriber, TranscriptionOutput, TranscriptionProvider};
use recap_types::transcript::clean_text;
use recap_types::{new_id, Meeting, Transcript, TranscriptSegment, TranscriptStatus};
use tracing::{info, warn};

use crate::download::Downloader;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct TranscriptOutcome {
    pub transcript: Transcript,
    /// An earlier completed transcript was used and no provider was called
    pub reused: bool,
}

/// Produces (or reuses) the transcript for a meeting's recording
pub struct TranscriptionStage {
    store: Arc<dyn PersistenceClient>,
    transcriber: Arc<dyn Transcriber>,
    downloader: Downloader,
    max_video_bytes: u64,
    temp_dir: Option<PathBuf>,
    default_language: String,
}

impl TranscriptionStage {
    pub fn new(
        store: Arc<dyn PersistenceClient>,
        transcriber: Arc<dyn Transcriber>,
        downloader: Downloader,
        max_video_bytes: u64,
        temp_dir: Option<PathBuf>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transcriber,
            downloader,
            max_video_bytes,
            temp_dir,
            default_language: default_language.into(),
        }
    }
    
    pub fn provider(&self) -> TranscriptionProvider {
        self.transcriber.provider()
    }
    
    pub async fn ensure_transcript(&self, meeting: &Meeting) -> Result<TranscriptOutcome> {
        if let Some(transcript) = self.store.find_completed_transcript(&meeting.id).await? {
            info!(meeting_id = %meeting.id, transcript_id = %transcript.id, "Reusing completed transcript");
            return Ok(TranscriptOutcome {
                transcript,
                reused: true,
            });
        }
        
        let video = meeting
            .video_source()
            .ok_or_else(|| PipelineError::MissingMedia(meeting.id.clone()))?;
        let language = meeting
            .language
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.default_language);
        
        match self.transcribe(video, language).await {
            Ok(output) => {
                let transcript = self.completed_transcript(meeting, video, language, output);
                self.store.insert_transcript(transcript.clone()).await?;
                self.store.attach_transcript(&meeting.id, &transcript.id).await?;
                info!(
                    meeting_id = %meeting.id,
                    transcript_id = %transcript.id,
                    status = ?transcript.status,
                    segments = transcript.segments.len(),
                    "Transcript stored"
                );
                Ok(TranscriptOutcome {
                    transcript,
                    reused: false,
                })
            }
            Err(e) => {
                let failed = self.failed_transcript(meeting, video, language, &e);
                if let Err(store_err) = self.store.insert_transcript(failed).await {
                    warn!(meeting_id = %meeting.id, error = %store_err, "Could not record failed transcript");
                }
                Err(e)
            }
        }
    }
    
    async fn transcribe(&self, video: &str, language: &str) -> Result<TranscriptionOutput> {
        let mut source = AudioSource::url(video);
        
        // Held until the provider returns; dropping it removes the file
        let _media = if self.transcriber.is_network() {
            let file = self
                .downloader
                .fetch_to_temp(video, self.max_video_bytes, self.temp_dir.as_deref())
                .await?;
            source = source.with_local_file(file.path());
            Some(file)
        } else {
            None
        };
        
        let output = self.transcriber.transcribe(&source, language).await?;
        if self.transcriber.is_network() && output.text.trim().is_empty() {
            return Err(PipelineError::EmptyTranscript);
        }
        Ok(output)
    }
    
    fn completed_transcript(
        &self,
        meeting: &Meeting,
        video: &str,
        language: &str,
        output: TranscriptionOutput,
    ) -> Transcript {
        let cleaned = clean_text(&output.text);
        let status = if cleaned.is_empty() {
            TranscriptStatus::Skipped
        } else {
            TranscriptStatus::Completed
        };
        
        Transcript {
            id: new_id(),
            meeting_id: meeting.id.clone(),
            source_url: Some(video.to_string()),
            duration_secs: output.duration,
            raw_text: output.text,
            cleaned_text: cleaned,
            segments: output
                .segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    speaker: s.speaker,
                    text: s.text,
                    confidence: s.confidence,
                })
                .collect(),
            provider: self.transcriber.provider().to_string(),
            language: output.language.or_else(|| Some(language.to_string())),
            status,
            error: None,
            created_at: Utc::now(),
        }
    }
    
    fn failed_transcript(&self, meeting: &Meeting, video: &str, language: &str, error: &PipelineError) -> Transcript {
        Transcript {
            id: new_id(),
            meeting_id: meeting.id.clone(),
            source_url: Some(video.to_string()),
            duration_secs: None,
            raw_text: String::new(),
            cleaned_text: String::new(),
            segments: Vec::new(),
            provider: self.transcriber.provider().to_string(),
            language: Some(language.to_string()),
            status: TranscriptStatus::Failed,
            error: Some(error.to_string()),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recap_persist::InMemoryPersistence;
    use recap_transcribe::NoopTranscriber;
    use std::time::Duration;

    fn stage(store: Arc<InMemoryPersistence>) -> TranscriptionStage {
        TranscriptionStage::new(
            store,
            Arc::new(NoopTranscriber),
            Downloader::new(Duration::from_secs(5)).unwrap(),
            1024,
            None,
            "en",
        )
    }

    #[tokio::test]
    async fn test_disabled_provider_records_skipped_transcript() {
        let store = Arc::new(InMemoryPersistence::new());
        let meeting = Meeting::new("m1").with_video("https://cdn.example.com/rec.mp4");
        store.insert_meeting(meeting.clone()).await;

        let outcome = stage(store.clone()).ensure_transcript(&meeting).await.unwrap();

        assert!(!outcome.reused);
        assert_eq!(outcome.transcript.status, TranscriptStatus::Skipped);
        assert!(!outcome.transcript.is_usable());
        assert_eq!(outcome.transcript.provider, "none");
        let stored = store.get_meeting("m1").await.unwrap().unwrap();
        assert_eq!(stored.transcript_id.as_deref(), Some(outcome.transcript.id.as_str()));
    }

    #[tokio::test]
    async fn test_missing_video_is_a_precondition_failure() {
        let store = Arc::new(InMemoryPersistence::new());
        let meeting = Meeting::new("m1").with_video("   ");

        let err = stage(store.clone()).ensure_transcript(&meeting).await.unwrap_err();

        assert!(matches!(err, PipelineError::MissingMedia(_)));
        assert!(store.list_transcripts("m1").await.unwrap().is_empty());
    }
}
