use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use recap_queue::{Job, JobState};
use recap_types::{JobOptions, JobPayload, JobResult, ProgressEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::{ApiError, ApiResult}, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub meeting_id: String,
    #[serde(default)]
    pub regenerate: bool,
    #[serde(default)]
    pub options: JobOptions,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub job_id: String,
    pub meeting_id: String,
    pub state: JobState,
    pub attempts_made: u32,
    pub max_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            meeting_id: job.meeting_id().to_string(),
            job_id: job.id,
            state: job.state,
            attempts_made: job.attempts_made,
            max_attempts: job.max_attempts,
            progress: job.progress,
            result: job.result,
            error: job.failed_reason,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    /// Comma-separated states; open states when absent
    #[serde(default)]
    pub state: Option<String>,
}

/// Enqueue a summarization job, refusing when the meeting already has one open
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<JobResponse>)> {
    let meeting_id = req.meeting_id.trim().to_string();
    if meeting_id.is_empty() {
        return Err(ApiError::BadRequest("meetingId is required".to_string()));
    }
    
    if let Some(open) = state.queue.find_open_job(&meeting_id).await? {
        return Err(ApiError::JobAlreadyOpen {
            meeting_id,
            job_id: open.id,
        });
    }
    
    if state.store.get_meeting(&meeting_id).await?.is_none() {
        return Err(ApiError::MeetingNotFound(meeting_id));
    }
    
    let payload = JobPayload {
        meeting_id,
        regenerate: req.regenerate,
        options: req.options,
    };
    let job = state.queue.enqueue(payload).await?;
    tracing::info!(
        job_id = %job.id,
        meeting_id = %job.meeting_id(),
        regenerate = job.payload.regenerate,
        "Summarization job enqueued"
    );
    
    Ok((StatusCode::ACCEPTED, Json(job.into())))
}

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let job = state
        .queue
        .get_job(&job_id)
        .await?
        .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;
    Ok(Json(job.into()))
}

pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<Vec<JobResponse>>> {
    let states = match query.state.as_deref() {
        Some(raw) => parse_states(raw)?,
        None => JobState::OPEN.to_vec(),
    };
    let jobs = state.queue.list_jobs(&states).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

fn parse_states(raw: &str) -> ApiResult<Vec<JobState>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "waiting" => Ok(JobState::Waiting),
            "delayed" => Ok(JobState::Delayed),
            "active" => Ok(JobState::Active),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            other => Err(ApiError::BadRequest(format!("unknown job state: {}", other))),
        })
        .collect()
}
