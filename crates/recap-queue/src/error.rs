use thiserror::Error;

use crate::job::JobState;

#[derive(Error, Debug)]
pub enum QueueError {
    /// Backend cannot be reached; callers answer 503
    #[error("Queue backend unavailable: {0}")]
    Unavailable(String),
    
    #[error("Job not found: {0}")]
    JobNotFound(String),
    
    #[error("Job {job_id} is {state}, expected active")]
    NotActive { job_id: String, state: JobState },
    
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),
    
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueueError {
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            #[cfg(feature = "mongodb")]
            Self::Database(e) => matches!(
                e.kind.as_ref(),
                mongodb::error::ErrorKind::Io(_)
                    | mongodb::error::ErrorKind::ServerSelection { .. }
                    | mongodb::error::ErrorKind::ConnectionPoolCleared { .. }
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
