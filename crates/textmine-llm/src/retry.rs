//! Bounded retry with exponential backoff around backend calls
//!
//! Backends report plain errors; this module classifies them into retryable
//! and fatal outcomes and drives the retry loop with a caller-supplied policy.

use crate::{LlmError, ModelBackend};
use std::time::Duration;
use tracing::warn;

/// Classification of a failed completion attempt
#[derive(Debug)]
pub enum CompletionOutcome {
    /// Transient failure, worth another attempt after backoff
    Retryable(LlmError),

    /// Permanent failure; retrying cannot help
    Fatal(LlmError),
}

impl CompletionOutcome {
    /// Classify an error from a backend call
    pub fn classify(error: LlmError) -> Self {
        match error {
            LlmError::Timeout { .. } | LlmError::Backend { .. } | LlmError::RateLimited => {
                CompletionOutcome::Retryable(error)
            }
            LlmError::ModelNotAvailable(_)
            | LlmError::InvalidResponse(_)
            | LlmError::MissingCredentials(_) => CompletionOutcome::Fatal(error),
        }
    }

    /// Unwrap the underlying error
    pub fn into_error(self) -> LlmError {
        match self {
            CompletionOutcome::Retryable(e) | CompletionOutcome::Fatal(e) => e,
        }
    }
}

/// Retry policy for backend calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts, including the first
    pub max_attempts: u32,

    /// Base backoff delay; doubles after each failed attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy with a given attempt count and the default backoff curve
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Backoff delay before attempt `attempt` (1-based; first retry is 1)
    fn delay_for(&self, attempt: u32) -> Duration {
        // Exponential backoff: base, 2*base, 4*base, ...
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Call `backend.complete` with bounded retries and exponential backoff
///
/// Retryable errors (timeout, transport, rate limit) are retried up to the
/// policy's attempt limit; fatal errors return immediately. The last error
/// is returned when attempts are exhausted.
pub async fn complete_with_retry(
    backend: &dyn ModelBackend,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<String, LlmError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match backend.complete(prompt).await {
            Ok(response) => return Ok(response),
            Err(error) => match CompletionOutcome::classify(error) {
                CompletionOutcome::Fatal(error) => return Err(error),
                CompletionOutcome::Retryable(error) => {
                    if attempt >= policy.max_attempts {
                        return Err(error);
                    }
                    let delay = policy.delay_for(attempt);
                    warn!(
                        backend = backend.name(),
                        attempt,
                        max_attempts = policy.max_attempts,
                        "completion failed, retrying in {:?}: {}",
                        delay,
                        error
                    );
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }
}
