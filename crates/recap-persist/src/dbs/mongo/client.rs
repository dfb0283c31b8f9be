use async_trait::async_trait;
use mongodb::{Client, bson::doc, bson::oid::ObjectId};

use recap_types::{ActionItem, Meeting, ProcessingLog, ProcessingStatus, Summary, Transcript};

use crate::dbs::mongo::repositories::{
    MongoActionItemRepository, MongoMeetingRepository, MongoProcessingLogRepository,
    MongoSummaryRepository, MongoTranscriptRepository,
};
use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

pub struct MongoPersistenceClient {
    client: Client,
    database: String,
    meeting_repo: MongoMeetingRepository,
    transcript_repo: MongoTranscriptRepository,
    summary_repo: MongoSummaryRepository,
    action_item_repo: MongoActionItemRepository,
    log_repo: MongoProcessingLogRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB, create repositories and make sure indexes exist
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        Self::from_client(client, database).await
    }
    
    pub async fn from_client(client: Client, database: &str) -> Result<Self> {
        let this = Self {
            meeting_repo: MongoMeetingRepository::new(&client, database),
            transcript_repo: MongoTranscriptRepository::new(&client, database),
            summary_repo: MongoSummaryRepository::new(&client, database),
            action_item_repo: MongoActionItemRepository::new(&client, database),
            log_repo: MongoProcessingLogRepository::new(&client, database),
            database: database.to_string(),
            client,
        };
        
        this.transcript_repo.ensure_indexes().await?;
        this.summary_repo.ensure_indexes().await?;
        this.action_item_repo.ensure_indexes().await?;
        this.log_repo.ensure_indexes().await?;
        
        tracing::info!(database = %this.database, "MongoDB persistence ready");
        Ok(this)
    }
}

fn parse_meeting_id(meeting_id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(meeting_id).map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn get_meeting(&self, meeting_id: &str) -> Result<Option<Meeting>> {
        let meeting = self.meeting_repo.get_meeting(parse_meeting_id(meeting_id)?).await?;
        Ok(meeting.map(Into::into))
    }
    
    async fn set_processing_status(
        &self,
        meeting_id: &str,
        status: ProcessingStatus,
        job_id: Option<&str>,
    ) -> Result<()> {
        self.meeting_repo
            .set_status(parse_meeting_id(meeting_id)?, status, job_id)
            .await
    }
    
    async fn attach_transcript(&self, meeting_id: &str, transcript_id: &str) -> Result<()> {
        self.meeting_repo
            .set_transcript(parse_meeting_id(meeting_id)?, transcript_id)
            .await
    }
    
    async fn complete_meeting(&self, meeting_id: &str, summary_id: &str) -> Result<()> {
        self.meeting_repo
            .complete(parse_meeting_id(meeting_id)?, summary_id)
            .await
    }
    
    async fn find_completed_transcript(&self, meeting_id: &str) -> Result<Option<Transcript>> {
        self.transcript_repo.find_completed(meeting_id).await
    }
    
    async fn insert_transcript(&self, transcript: Transcript) -> Result<()> {
        self.transcript_repo.insert(&transcript).await
    }
    
    async fn list_transcripts(&self, meeting_id: &str) -> Result<Vec<Transcript>> {
        self.transcript_repo.list(meeting_id).await
    }
    
    async fn latest_version(&self, meeting_id: &str) -> Result<u32> {
        self.summary_repo.latest_version(meeting_id).await
    }
    
    async fn insert_summary_version(&self, summary: Summary) -> Result<Summary> {
        self.summary_repo.insert_version(summary).await
    }
    
    async fn list_summaries(&self, meeting_id: &str) -> Result<Vec<Summary>> {
        self.summary_repo.list(meeting_id).await
    }
    
    async fn latest_summary(&self, meeting_id: &str) -> Result<Option<Summary>> {
        self.summary_repo.latest(meeting_id).await
    }
    
    async fn insert_action_items(&self, items: Vec<ActionItem>) -> Result<Vec<String>> {
        self.action_item_repo.insert_many(&items).await?;
        Ok(items.into_iter().map(|i| i.id).collect())
    }
    
    async fn set_summary_action_items(&self, summary_id: &str, item_ids: &[String]) -> Result<()> {
        self.summary_repo.set_action_items(summary_id, item_ids).await
    }
    
    async fn list_action_items(&self, summary_id: &str) -> Result<Vec<ActionItem>> {
        self.action_item_repo.list_for_summary(summary_id).await
    }
    
    async fn append_processing_log(&self, log: ProcessingLog) -> Result<()> {
        self.log_repo.append(&log).await
    }
    
    async fn list_processing_logs(&self, job_id: &str) -> Result<Vec<ProcessingLog>> {
        self.log_repo.list_for_job(job_id).await
    }
    
    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        Ok(())
    }
}
