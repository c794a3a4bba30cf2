//! Fixed-interval polling with an optional attempt budget and cancellation

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_POLL_INTERVAL;

/// Why a poll stopped without a result
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PollError {
    #[error("Gave up after {attempts} attempt(s)")]
    Exhausted { attempts: u32 },
    #[error("Cancelled")]
    Cancelled,
}

/// How long and how often to wait on remote state
#[derive(Clone, Debug)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: Option<u32>,
    cancel: CancellationToken,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl PollPolicy {
    /// Unbounded polling at `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Limit the number of checks; `None` polls forever
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Stop polling when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Token that aborts every poll using this policy
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `check` until it yields a value
    ///
    /// `check` receives the 1-based attempt number. An error from `check`
    /// ends the poll immediately.
    pub async fn poll_until<T, E, F, Fut>(&self, mut check: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: From<PollError>,
    {
        let mut attempt = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                return Err(PollError::Cancelled.into());
            }

            attempt += 1;
            if let Some(value) = check(attempt).await? {
                return Ok(value);
            }

            if let Some(max) = self.max_attempts {
                if attempt >= max {
                    return Err(PollError::Exhausted { attempts: attempt }.into());
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(PollError::Cancelled.into()),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
