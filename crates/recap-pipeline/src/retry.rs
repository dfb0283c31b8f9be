use std::time::Duration;
use tracing::{debug, warn};

use recap_llm::LlmError;

/// Errors that can tell whether another attempt may succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for LlmError {
    fn is_retryable(&self) -> bool {
        LlmError::is_retryable(self)
    }
}

/// Exponential backoff without jitter, so delays never decrease
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }
    
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }
    
    /// Delay after the `retry`-th failure (0-based): initial, initial*2, ... capped
    pub fn calculate_backoff(&self, retry: usize) -> Duration {
        let backoff = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(retry as i32);
        let backoff = backoff.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(backoff as u64)
    }
    
    /// Run `f` until it succeeds, fails with a non-retryable error, or attempts run out
    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let backoff = self.calculate_backoff(attempt - 1);
                debug!(
                    "Retry attempt {}/{}, backing off for {:?}",
                    attempt + 1,
                    self.max_attempts,
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }
            
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("Operation succeeded on retry attempt {}", attempt + 1);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Operation failed on attempt {}/{}: {}",
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    
                    attempt += 1;
                    if !e.is_retryable() || attempt >= self.max_attempts {
                        return Err(e);
                    }
                }
            }
        }
    }
}
