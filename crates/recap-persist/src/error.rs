use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),
    
    #[cfg(feature = "mongodb")]
    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),
    
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),
    
    #[error("Summary not found: {0}")]
    SummaryNotFound(String),
    
    #[error("Summary version {version} already exists for meeting {meeting_id}")]
    VersionConflict { meeting_id: String, version: u32 },
    
    #[error("Invalid object ID: {0}")]
    InvalidObjectId(String),
    
    #[error("Connection error: {0}")]
    Connection(String),
    
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    /// Storage hiccups worth another pipeline attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::VersionConflict { .. } => true,
            #[cfg(feature = "mongodb")]
            Self::Database(e) => matches!(
                e.kind.as_ref(),
                mongodb::error::ErrorKind::Io(_)
                    | mongodb::error::ErrorKind::ConnectionPoolCleared { .. }
                    | mongodb::error::ErrorKind::ServerSelection { .. }
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
