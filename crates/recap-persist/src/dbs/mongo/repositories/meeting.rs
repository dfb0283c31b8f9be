use mongodb::{Client, Collection, bson, bson::doc, bson::oid::ObjectId};

use recap_types::ProcessingStatus;

use crate::dbs::mongo::models::MongoMeeting;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoMeetingRepository {
    collection: Collection<MongoMeeting>,
}

impl MongoMeetingRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("meetings");
        Self { collection }
    }
    
    pub async fn get_meeting(&self, meeting_id: ObjectId) -> Result<Option<MongoMeeting>> {
        Ok(self.collection.find_one(doc! { "_id": meeting_id }).await?)
    }
    
    pub async fn set_status(
        &self,
        meeting_id: ObjectId,
        status: ProcessingStatus,
        job_id: Option<&str>,
    ) -> Result<()> {
        let mut set = doc! {
            "processingStatus": status.as_str(),
            "updatedAt": bson::DateTime::now(),
        };
        if let Some(job_id) = job_id {
            set.insert("lastJobId", job_id);
        }
        self.update(meeting_id, doc! { "$set": set }).await
    }
    
    pub async fn set_transcript(&self, meeting_id: ObjectId, transcript_id: &str) -> Result<()> {
        self.update(
            meeting_id,
            doc! { "$set": { "transcriptId": transcript_id, "updatedAt": bson::DateTime::now() } },
        )
        .await
    }
    
    pub async fn complete(&self, meeting_id: ObjectId, summary_id: &str) -> Result<()> {
        self.update(
            meeting_id,
            doc! {
                "$set": {
                    "processingStatus": ProcessingStatus::Completed.as_str(),
                    "summaryId": summary_id,
                    "updatedAt": bson::DateTime::now(),
                },
                "$push": { "summaryHistory": summary_id },
            },
        )
        .await
    }
    
    async fn update(&self, meeting_id: ObjectId, update: bson::Document) -> Result<()> {
        let result = self.collection.update_one(doc! { "_id": meeting_id }, update).await?;
        if result.matched_count == 0 {
            return Err(PersistError::MeetingNotFound(meeting_id.to_hex()));
        }
        Ok(())
    }
}
