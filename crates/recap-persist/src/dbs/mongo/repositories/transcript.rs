use futures::TryStreamExt;
use mongodb::{Client, Collection, IndexModel, bson::doc};

use recap_types::Transcript;

use crate::error::Result;

#[derive(Clone)]
pub struct MongoTranscriptRepository {
    collection: Collection<Transcript>,
}

impl MongoTranscriptRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("transcripts");
        Self { collection }
    }
    
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "meeting_id": 1, "status": 1, "created_at": -1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
    
    pub async fn insert(&self, transcript: &Transcript) -> Result<()> {
        self.collection.insert_one(transcript).await?;
        Ok(())
    }
    
    pub async fn find_completed(&self, meeting_id: &str) -> Result<Option<Transcript>> {
        let filter = doc! { "meeting_id": meeting_id, "status": "completed" };
        Ok(self
            .collection
            .find_one(filter)
            .sort(doc! { "created_at": -1 })
            .await?)
    }
    
    pub async fn list(&self, meeting_id: &str) -> Result<Vec<Transcript>> {
        let transcripts = self
            .collection
            .find(doc! { "meeting_id": meeting_id })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(transcripts)
    }
}
