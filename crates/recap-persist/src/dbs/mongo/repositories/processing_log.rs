use futures::TryStreamExt;
use mongodb::{Client, Collection, IndexModel, bson::doc};

use recap_types::ProcessingLog;

use crate::error::Result;

/// Insert-only
#[derive(Clone)]
pub struct MongoProcessingLogRepository {
    collection: Collection<ProcessingLog>,
}

impl MongoProcessingLogRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("processing_logs");
        Self { collection }
    }
    
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "job_id": 1, "created_at": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
    
    pub async fn append(&self, log: &ProcessingLog) -> Result<()> {
        self.collection.insert_one(log).await?;
        Ok(())
    }
    
    pub async fn list_for_job(&self, job_id: &str) -> Result<Vec<ProcessingLog>> {
        let logs = self
            .collection
            .find(doc! { "job_id": job_id })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(logs)
    }
}
