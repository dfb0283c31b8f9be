use futures::TryStreamExt;
use mongodb::{Client, Collection, IndexModel, bson::doc};

use recap_types::ActionItem;

use crate::error::Result;

#[derive(Clone)]
pub struct MongoActionItemRepository {
    collection: Collection<ActionItem>,
}

impl MongoActionItemRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("action_items");
        Self { collection }
    }
    
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder().keys(doc! { "summary_id": 1 }).build();
        self.collection.create_index(index).await?;
        Ok(())
    }
    
    pub async fn insert_many(&self, items: &[ActionItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.collection.insert_many(items).await?;
        Ok(())
    }
    
    pub async fn list_for_summary(&self, summary_id: &str) -> Result<Vec<ActionItem>> {
        let items = self
            .collection
            .find(doc! { "summary_id": summary_id })
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }
}
