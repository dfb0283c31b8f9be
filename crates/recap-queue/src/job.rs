use chrono::{DateTime, Utc};
use recap_types::{JobPayload, JobResult, ProgressEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    /// Waiting for its backoff to elapse before the next attempt
    Delayed,
    Active,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Delayed => "delayed",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
    
    /// States that block another enqueue for the same meeting
    pub const OPEN: [JobState; 3] = [JobState::Waiting, JobState::Delayed, JobState::Active];
    
    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempt and timing limits stamped onto each job at enqueue time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay; doubles with every failed attempt
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    5_000
}

fn default_timeout_ms() -> u64 {
    300_000
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub payload: JobPayload,
    pub state: JobState,
    /// Incremented when the job is claimed
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub timeout_ms: u64,
    /// Earliest time the job may be claimed
    pub run_at: DateTime<Utc>,
    pub progress: Option<ProgressEvent>,
    pub result: Option<JobResult>,
    pub failed_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(payload: JobPayload, settings: &JobSettings) -> Self {
        let now = Utc::now();
        Self {
            id: recap_types::new_id(),
            payload,
            state: JobState::Waiting,
            attempts_made: 0,
            max_attempts: settings.max_attempts.max(1),
            backoff_ms: settings.backoff_ms,
            timeout_ms: settings.timeout_ms,
            run_at: now,
            progress: None,
            result: None,
            failed_reason: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }
    
    pub fn meeting_id(&self) -> &str {
        &self.payload.meeting_id
    }
    
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
    
    /// Delay before the retry that follows failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << exponent))
    }
    
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state, JobState::Waiting | JobState::Delayed) && self.run_at <= now
    }
    
    /// Active for longer than its timeout
    pub fn is_stalled(&self, now: DateTime<Utc>) -> bool {
        self.state == JobState::Active
            && self
                .started_at
                .map(|started| now - started > chrono::Duration::milliseconds(self.timeout_ms as i64))
                .unwrap_or(false)
    }
    
    pub(crate) fn mark_active(&mut self, now: DateTime<Utc>) {
        self.state = JobState::Active;
        self.attempts_made += 1;
        self.started_at = Some(now);
        self.progress = None;
        self.updated_at = now;
    }
    
    pub(crate) fn mark_completed(&mut self, result: JobResult, now: DateTime<Utc>) {
        self.state = JobState::Completed;
        self.result = Some(result);
        self.failed_reason = None;
        self.finished_at = Some(now);
        self.updated_at = now;
    }
    
    /// Either schedule the next attempt or fail for good
    pub(crate) fn mark_failed(&mut self, reason: &str, unrecoverable: bool, now: DateTime<Utc>) {
        self.failed_reason = Some(reason.to_string());
        self.updated_at = now;
        
        if unrecoverable || self.attempts_made >= self.max_attempts {
            self.state = JobState::Failed;
            self.finished_at = Some(now);
        } else {
            let delay = self.delay_for(self.attempts_made);
            self.state = JobState::Delayed;
            self.run_at = now + chrono::Duration::milliseconds(delay.as_millis() as i64);
        }
    }
}
