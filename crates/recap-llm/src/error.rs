use thiserror::Error;

/// Errors returned by chat clients.
///
/// The variants split along the line the retry policy cares about: anything that
/// looks like a connection problem or provider throttling is retryable, everything
/// else (bad credentials, malformed requests, unparseable bodies) is not.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),
    
    #[error("Request timed out: {0}")]
    Timeout(String),
    
    #[error("Rate limited by provider: {0}")]
    RateLimited(String),
    
    #[error("Provider unavailable ({status}): {body}")]
    ServiceUnavailable { status: u16, body: String },
    
    #[error("Authentication failed ({status}): {body}")]
    Auth { status: u16, body: String },
    
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },
    
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;

impl LlmError {
    /// Map a non-success HTTP status to an error variant
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth { status, body },
            429 => Self::RateLimited(body),
            502..=504 => Self::ServiceUnavailable { status, body },
            _ => Self::Api { status, body },
        }
    }
    
    /// Whether a caller may retry the same request
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Timeout(_)
                | Self::RateLimited(_)
                | Self::ServiceUnavailable { .. }
        )
    }
    
    /// HTTP status reported by the provider, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited(_) => Some(429),
            Self::ServiceUnavailable { status, .. }
            | Self::Auth { status, .. }
            | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
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
            // connect, request and body errors all mean the exchange never completed
            Self::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
