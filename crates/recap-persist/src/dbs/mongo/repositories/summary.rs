use futures::TryStreamExt;
use mongodb::{
    Client, ClientSession, Collection, IndexModel,
    bson::doc,
    options::IndexOptions,
};

use recap_types::Summary;

use crate::dbs::mongo::is_duplicate_key;
use crate::error::{PersistError, Result};

/// Attempts at claiming the next version when concurrent writers collide
const MAX_VERSION_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct MongoSummaryRepository {
    client: Client,
    collection: Collection<Summary>,
}

impl MongoSummaryRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("summaries");
        Self {
            client: client.clone(),
            collection,
        }
    }
    
    pub async fn ensure_indexes(&self) -> Result<()> {
        let unique_version = IndexModel::builder()
            .keys(doc! { "meeting_id": 1, "version": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let unique_id = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_indexes([unique_version, unique_id]).await?;
        Ok(())
    }
    
    pub async fn latest_version(&self, meeting_id: &str) -> Result<u32> {
        let newest = self
            .collection
            .find_one(doc! { "meeting_id": meeting_id })
            .sort(doc! { "version": -1 })
            .await?;
        Ok(newest.map(|s| s.version).unwrap_or(0))
    }
    
    /// Flip the previous latest and insert the next version in one transaction.
    ///
    /// Requires a replica set. A unique `(meeting_id, version)` index turns a
    /// concurrent writer into a duplicate-key error, which is retried with a
    /// freshly computed version.
    pub async fn insert_version(&self, mut summary: Summary) -> Result<Summary> {
        let mut last_version = 0;
        for attempt in 1..=MAX_VERSION_ATTEMPTS {
            let mut session = self.client.start_session().await?;
            session.start_transaction().await?;
            
            match self.flip_and_insert(&mut session, &mut summary).await {
                Ok(()) => {
                    session.commit_transaction().await?;
                    return Ok(summary);
                }
                Err(PersistError::Database(e)) if is_duplicate_key(&e) => {
                    let _ = session.abort_transaction().await;
                    last_version = summary.version;
                    tracing::warn!(
                        meeting_id = %summary.meeting_id,
                        version = summary.version,
                        attempt,
                        "Summary version already taken, recomputing"
                    );
                }
                Err(e) => {
                    let _ = session.abort_transaction().await;
                    return Err(e);
                }
            }
        }
        
        Err(PersistError::VersionConflict {
            meeting_id: summary.meeting_id,
            version: last_version,
        })
    }
    
    async fn flip_and_insert(&self, session: &mut ClientSession, summary: &mut Summary) -> Result<()> {
        let newest = self
            .collection
            .find_one(doc! { "meeting_id": &summary.meeting_id })
            .sort(doc! { "version": -1 })
            .session(&mut *session)
            .await?;
        
        summary.version = newest.map(|s| s.version).unwrap_or(0) + 1;
        summary.is_latest = true;
        
        self.collection
            .update_many(
                doc! { "meeting_id": &summary.meeting_id, "is_latest": true },
                doc! { "$set": { "is_latest": false } },
            )
            .session(&mut *session)
            .await?;
        self.collection
            .insert_one(&*summary)
            .session(&mut *session)
            .await?;
        Ok(())
    }
    
    pub async fn list(&self, meeting_id: &str) -> Result<Vec<Summary>> {
        let summaries = self
            .collection
            .find(doc! { "meeting_id": meeting_id })
            .sort(doc! { "version": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(summaries)
    }
    
    pub async fn latest(&self, meeting_id: &str) -> Result<Option<Summary>> {
        Ok(self
            .collection
            .find_one(doc! { "meeting_id": meeting_id, "is_latest": true })
            .await?)
    }
    
    pub async fn set_action_items(&self, summary_id: &str, item_ids: &[String]) -> Result<()> {
        let result = self
            .collection
            .update_one(
                doc! { "id": summary_id },
                doc! { "$set": { "action_items": item_ids.to_vec() } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(PersistError::SummaryNotFound(summary_id.to_string()));
        }
        Ok(())
    }
}
