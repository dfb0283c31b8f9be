use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Meeting not found: {0}")]
    MeetingNotFound(String),
    
    #[error("Job not found: {0}")]
    JobNotFound(String),
    
    #[error("Meeting {meeting_id} already has an open job {job_id}")]
    JobAlreadyOpen { meeting_id: String, job_id: String },
    
    #[error("Invalid request: {0}")]
    BadRequest(String),
    
    #[error("Queue error: {0}")]
    Queue(#[from] recap_queue::QueueError),
    
    #[error("Persistence error: {0}")]
    Persist(#[from] recap_persist::PersistError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MeetingNotFound(_) | ApiError::JobNotFound(_) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::JobAlreadyOpen { .. } => {
                (StatusCode::CONFLICT, self.to_string())
            }
            ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::Queue(ref e) if e.is_unavailable() => {
                tracing::error!("Queue unavailable: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Queue unavailable".to_string())
            }
            ApiError::Queue(ref e) => {
                tracing::error!("Queue error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Queue error".to_string())
            }
            ApiError::Persist(recap_persist::PersistError::Connection(ref e)) => {
                tracing::error!("Storage unavailable: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable".to_string())
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
        };
        
        let body = Json(json!({
            "error": message
        }));
        
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
