// Process-local store used by tests and single-process runs

use async_trait::async_trait;
use recap_types::{ActionItem, Meeting, ProcessingLog, ProcessingStatus, Summary, Transcript, TranscriptStatus};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

#[derive(Default)]
struct State {
    meetings: HashMap<String, Meeting>,
    transcripts: Vec<Transcript>,
    summaries: Vec<Summary>,
    action_items: Vec<ActionItem>,
    logs: Vec<ProcessingLog>,
}

/// All collections behind one lock, so the version flip is trivially atomic
#[derive(Default)]
pub struct InMemoryPersistence {
    state: RwLock<State>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Seed or replace a meeting
    pub async fn insert_meeting(&self, meeting: Meeting) {
        self.state.write().await.meetings.insert(meeting.id.clone(), meeting);
    }
    
    async fn update_meeting<F>(&self, meeting_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Meeting) + Send,
    {
        let mut state = self.state.write().await;
        let meeting = state
            .meetings
            .get_mut(meeting_id)
            .ok_or_else(|| PersistError::MeetingNotFound(meeting_id.to_string()))?;
        apply(meeting);
        Ok(())
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistence {
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>> {
        Ok(self.state.read().await.meetings.get(meeting_id).cloned())
    }
    
    async fn set_processing_status(
        &self,
        meeting_id: &str,
        status: ProcessingStatus,
        job_id: Option<&str>,
    ) -> Result<()> {
        let job_id = job_id.map(str::to_string);
        self.update_meeting(meeting_id, move |m| {
            m.processing_status = status;
            if job_id.is_some() {
                m.last_job_id = job_id;
            }
        })
        .await
    }
    
    async fn attach_transcript(&self, meeting_id: &str, transcript_id: &str) -> Result<()> {
        let transcript_id = transcript_id.to_string();
        self.update_meeting(meeting_id, move |m| m.transcript_id = Some(transcript_id))
            .await
    }
    
    async fn complete_meeting(&self, meeting_id: &str, summary_id: &str) -> Result<()> {
        let summary_id = summary_id.to_string();
        self.update_meeting(meeting_id, move |m| {
            m.processing_status = ProcessingStatus::Completed;
            m.summary_history.push(summary_id.clone());
            m.summary_id = Some(summary_id);
        })
        .await
    }
    
    async fn find_completed_transcript(&self, meeting_id: &str) -> Result<Option<Transcript>> {
        let state = self.state.read().await;
        Ok(state
            .transcripts
            .iter()
            .filter(|t| t.meeting_id == meeting_id && t.status == TranscriptStatus::Completed)
            .max_by_key(|t| t.created_at)
            .cloned())
    }
    
    async fn insert_transcript(&self, transcript: Transcript) -> Result<()> {
        self.state.write().await.transcripts.push(transcript);
        Ok(())
    }
    
    async fn list_transcripts(&self, meeting_id: &str) -> Result<Vec<Transcript>> {
        let state = self.state.read().await;
        Ok(state
            .transcripts
            .iter()
            .filter(|t| t.meeting_id == meeting_id)
            .cloned()
            .collect())
    }
    
    async fn latest_version(&self, meeting_id: &str) -> Result<u32> {
        let state = self.state.read().await;
        Ok(max_version(&state.summaries, meeting_id))
    }
    
    async fn insert_summary_version(&self, mut summary: Summary) -> Result<Summary> {
        let mut state = self.state.write().await;
        summary.version = max_version(&state.summaries, &summary.meeting_id) + 1;
        summary.is_latest = true;
        
        for existing in state
            .summaries
            .iter_mut()
            .filter(|s| s.meeting_id == summary.meeting_id)
        {
            existing.is_latest = false;
        }
        state.summaries.push(summary.clone());
        Ok(summary)
    }
    
    async fn list_summaries(&self, meeting_id: &str) -> Result<Vec<Summary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<Summary> = state
            .summaries
            .iter()
            .filter(|s| s.meeting_id == meeting_id)
            .cloned()
            .collect();
        summaries.sort_by_key(|s| s.version);
        Ok(summaries)
    }
    
    async fn latest_summary(&self, meeting_id: &str) -> Result<Option<Summary>> {
        let state = self.state.read().await;
        Ok(state
            .summaries
            .iter()
            .find(|s| s.meeting_id == meeting_id && s.is_latest)
            .cloned())
    }
    
    async fn insert_action_items(&self, items: Vec<ActionItem>) -> Result<Vec<String>> {
        let ids = items.iter().map(|i| i.id.clone()).collect();
        self.state.write().await.action_items.extend(items);
        Ok(ids)
    }
    
    async fn set_summary_action_items(&self, summary_id: &str, item_ids: &[String]) -> Result<()> {
        let mut state = self.state.write().await;
        let summary = state
            .summaries
            .iter_mut()
            .find(|s| s.id == summary_id)
            .ok_or_else(|| PersistError::SummaryNotFound(summary_id.to_string()))?;
        summary.action_items = item_ids.to_vec();
        Ok(())
    }
    
    async fn list_action_items(&self, summary_id: &str) -> Result<Vec<ActionItem>> {
        let state = self.state.read().await;
        Ok(state
            .action_items
            .iter()
            .filter(|i| i.summary_id == summary_id)
            .cloned()
            .collect())
    }
    
    async fn append_processing_log(&self, log: ProcessingLog) -> Result<()> {
        self.state.write().await.logs.push(log);
        Ok(())
    }
    
    async fn list_processing_logs(&self, job_id: &str) -> Result<Vec<ProcessingLog>> {
        let state = self.state.read().await;
        Ok(state.logs.iter().filter(|l| l.job_id == job_id).cloned().collect())
    }
}

fn max_version(summaries: &[Summary], meeting_id: &str) -> u32 {
    summaries
        .iter()
        .filter(|s| s.meeting_id == meeting_id)
        .map(|s| s.version)
        .max()
        .unwrap_or(0)
}
