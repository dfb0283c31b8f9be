// MongoDB-backed queue; jobs are claimed with an atomic find-and-modify

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc},
    options::ReturnDocument,
    Client, Collection, IndexModel,
};
use recap_types::{JobPayload, JobResult, ProgressEvent};
use serde::{Deserialize, Serialize};

use crate::error::{QueueError, Result};
use crate::job::{Job, JobSettings, JobState};
use crate::traits::JobQueue;

/// MongoDB-specific job document (native dates so `run_at` can be compared server-side)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoJob {
    #[serde(rename = "_id")]
    pub id: String,
    pub payload: JobPayload,
    pub state: JobState,
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub backoff_ms: i64,
    pub timeout_ms: i64,
    pub run_at: bson::DateTime,
    #[serde(default)]
    pub progress: Option<ProgressEvent>,
    #[serde(default)]
    pub result: Option<JobResult>,
    #[serde(default)]
    pub failed_reason: Option<String>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
    #[serde(default)]
    pub started_at: Option<bson::DateTime>,
    #[serde(default)]
    pub finished_at: Option<bson::DateTime>,
}

fn to_bson(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

fn to_chrono(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

impl From<Job> for MongoJob {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            payload: job.payload,
            state: job.state,
            attempts_made: job.attempts_made,
            max_attempts: job.max_attempts,
            backoff_ms: job.backoff_ms as i64,
            timeout_ms: job.timeout_ms as i64,
            run_at: to_bson(job.run_at),
            progress: job.progress,
            result: job.result,
            failed_reason: job.failed_reason,
            created_at: to_bson(job.created_at),
            updated_at: to_bson(job.updated_at),
            started_at: job.started_at.map(to_bson),
            finished_at: job.finished_at.map(to_bson),
        }
    }
}

impl From<MongoJob> for Job {
    fn from(job: MongoJob) -> Self {
        Self {
            id: job.id,
            payload: job.payload,
            state: job.state,
            attempts_made: job.attempts_made,
            max_attempts: job.max_attempts,
            backoff_ms: job.backoff_ms.max(0) as u64,
            timeout_ms: job.timeout_ms.max(0) as u64,
            run_at: to_chrono(job.run_at),
            progress: job.progress,
            result: job.result,
            failed_reason: job.failed_reason,
            created_at: to_chrono(job.created_at),
            updated_at: to_chrono(job.updated_at),
            started_at: job.started_at.map(to_chrono),
            finished_at: job.finished_at.map(to_chrono),
        }
    }
}

fn state_names(states: &[JobState]) -> Vec<&'static str> {
    states.iter().map(JobState::as_str).collect()
}

pub struct MongoJobQueue {
    client: Client,
    database: String,
    settings: JobSettings,
    collection: Collection<MongoJob>,
}

impl MongoJobQueue {
    pub async fn connect(mongodb_uri: &str, database: &str, settings: JobSettings) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Self::from_client(client, database, settings).await
    }
    
    pub async fn from_client(client: Client, database: &str, settings: JobSettings) -> Result<Self> {
        let collection = client.database(database).collection("summarization_jobs");
        let queue = Self {
            client,
            database: database.to_string(),
            settings,
            collection,
        };
        queue.ensure_indexes().await?;
        Ok(queue)
    }
    
    async fn ensure_indexes(&self) -> Result<()> {
        let ready = IndexModel::builder()
            .keys(doc! { "state": 1, "run_at": 1 })
            .build();
        let by_meeting = IndexModel::builder()
            .keys(doc! { "payload.meetingId": 1, "state": 1 })
            .build();
        self.collection.create_indexes([ready, by_meeting]).await?;
        Ok(())
    }
    
    async fn load_active(&self, job_id: &str) -> Result<Job> {
        let job: Job = self
            .collection
            .find_one(doc! { "_id": job_id })
            .await?
            .ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?
            .into();
        if job.state != JobState::Active {
            return Err(QueueError::NotActive {
                job_id: job_id.to_string(),
                state: job.state,
            });
        }
        Ok(job)
    }
    
    /// Write back a job only if nobody else moved it out of `active`
    async fn replace_active(&self, job: Job) -> Result<Job> {
        let job_id = job.id.clone();
        let result = self
            .collection
            .replace_one(
                doc! { "_id": &job_id, "state": JobState::Active.as_str() },
                MongoJob::from(job.clone()),
            )
            .await?;
        if result.matched_count == 0 {
            return Err(QueueError::NotActive {
                job_id,
                state: job.state,
            });
        }
        Ok(job)
    }
}

#[async_trait]
impl JobQueue for MongoJobQueue {
    async fn enqueue(&self, payload: JobPayload) -> Result<Job> {
        let job = Job::new(payload, &self.settings);
        self.collection.insert_one(MongoJob::from(job.clone())).await?;
        tracing::debug!(job_id = %job.id, meeting_id = %job.meeting_id(), "Job enqueued");
        Ok(job)
    }
    
    async fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        Ok(self
            .collection
            .find_one(doc! { "_id": job_id })
            .await?
            .map(Into::into))
    }
    
    async fn list_jobs(&self, states: &[JobState]) -> Result<Vec<Job>> {
        let jobs: Vec<MongoJob> = self
            .collection
            .find(doc! { "state": { "$in": state_names(states) } })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(jobs.into_iter().map(Into::into).collect())
    }
    
    async fn find_open_job(&self, meeting_id: &str) -> Result<Option<Job>> {
        let filter = doc! {
            "payload.meetingId": meeting_id,
            "state": { "$in": state_names(&JobState::OPEN) },
        };
        Ok(self.collection.find_one(filter).await?.map(Into::into))
    }
    
    async fn claim_next(&self) -> Result<Option<Job>> {
        let now = bson::DateTime::now();
        let filter = doc! {
            "state": { "$in": [JobState::Waiting.as_str(), JobState::Delayed.as_str()] },
            "run_at": { "$lte": now },
        };
        let update = doc! {
            "$set": {
                "state": JobState::Active.as_str(),
                "started_at": now,
                "updated_at": now,
                "progress": bson::Bson::Null,
            },
            "$inc": { "attempts_made": 1 },
        };
        
        let claimed = self
            .collection
            .find_one_and_update(filter, update)
            .sort(doc! { "run_at": 1, "created_at": 1 })
            .return_document(ReturnDocument::After)
            .await?;
        Ok(claimed.map(Into::into))
    }
    
    async fn update_progress(&self, job_id: &str, progress: ProgressEvent) -> Result<()> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": job_id, "state": JobState::Active.as_str() },
                doc! { "$set": {
                    "progress": bson::to_bson(&progress)?,
                    "updated_at": bson::DateTime::now(),
                } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(QueueError::JobNotFound(job_id.to_string()));
        }
        Ok(())
    }
    
    async fn complete(&self, job_id: &str, result: JobResult) -> Result<Job> {
        let mut job = self.load_active(job_id).await?;
        job.mark_completed(result, Utc::now());
        self.replace_active(job).await
    }
    
    async fn fail(&self, job_id: &str, reason: &str, unrecoverable: bool) -> Result<Job> {
        let mut job = self.load_active(job_id).await?;
        job.mark_failed(reason, unrecoverable, Utc::now());
        self.replace_active(job).await
    }
    
    async fn recover_stalled(&self) -> Result<Vec<Job>> {
        let now = Utc::now();
        let active = self.list_jobs(&[JobState::Active]).await?;
        let mut recovered = Vec::new();
        
        for mut job in active.into_iter().filter(|j| j.is_stalled(now)) {
            let reason = format!("job exceeded its {}ms timeout", job.timeout_ms);
            job.mark_failed(&reason, false, now);
            match self.replace_active(job).await {
                Ok(job) => recovered.push(job),
                // Finished between the scan and the write
                Err(QueueError::NotActive { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(recovered)
    }
    
    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| QueueError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
