use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use super::AiError;

/// Fixed-interval polling bounded by a total wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus<T> {
    Pending,
    Done(T),
    Failed(String),
}

/// Calls `check` until the operation settles. The first check happens after one
/// interval; `AiError::Timeout` once `max_wait` has elapsed with the operation
/// still pending.
pub async fn poll_until_complete<T, F, Fut>(policy: PollPolicy, mut check: F) -> Result<T, AiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<OperationStatus<T>, AiError>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        if started.elapsed() >= policy.max_wait {
            tracing::warn!(attempts, max_wait = ?policy.max_wait, "Operation still pending, giving up");
            return Err(AiError::Timeout(policy.max_wait));
        }

        sleep(policy.interval).await;
        attempts += 1;

        match check().await? {
            OperationStatus::Pending => {
                tracing::debug!(attempts, "Operation pending");
            }
            OperationStatus::Done(value) => {
                tracing::info!(attempts, elapsed = ?started.elapsed(), "Operation finished");
                return Ok(value);
            }
            OperationStatus::Failed(message) => return Err(AiError::OperationFailed(message)),
        }
    }
}
