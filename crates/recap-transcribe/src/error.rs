use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Connection error: {0}")]
    Connection(String),
    
    #[error("Request timed out: {0}")]
    Timeout(String),
    
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),
    
    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },
    
    #[error("Transcription API error ({status}): {body}")]
    Api { status: u16, body: String },
    
    #[error("Provider reported failure: {0}")]
    Provider(String),
    
    #[error("Transcription did not finish after {polls} polls")]
    PollTimeout { polls: u32 },
    
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    
    #[error("Provider requires a local media file")]
    MissingMedia,
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TranscribeError>;

impl TranscribeError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth { status, body },
            429 => Self::RateLimited(body),
            _ => Self::Api { status, body },
        }
    }
    
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) | Self::RateLimited(_) | Self::PollTimeout { .. } => true,
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for TranscribeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TranscribeError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
