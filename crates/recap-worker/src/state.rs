use recap_persist::PersistenceClient;
use recap_queue::JobQueue;
use std::sync::Arc;

use crate::config::Config;

/// Shared state for the admin routes
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: Arc<dyn JobQueue>,
    pub store: Arc<dyn PersistenceClient>,
}

impl AppState {
    pub fn new(config: Config, queue: Arc<dyn JobQueue>, store: Arc<dyn PersistenceClient>) -> Self {
        Self {
            config: Arc::new(config),
            queue,
            store,
        }
    }
}
