//! Bounded exponential backoff for embedding requests

use crate::{LlmError, Oracle};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How often, and how patiently, a failed embedding request is repeated
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use unigraph_llm::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, 1000);
/// assert_eq!(policy.backoff(1), Duration::from_secs(1));
/// assert_eq!(policy.backoff(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, including the first; zero counts as one
    pub attempts: u32,
    /// Backoff before the second attempt, doubled after each further failure
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Policy of `attempts` tries starting at `backoff_ms` milliseconds
    pub fn new(attempts: u32, backoff_ms: u64) -> Self {
        Self {
            attempts,
            base_backoff: Duration::from_millis(backoff_ms),
        }
    }

    /// Backoff before retrying after the `attempt`-th failure (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `call` until it succeeds or the attempts are used up
    ///
    /// The last error is returned when every attempt fails.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    let backoff = self.backoff(attempt);
                    debug!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt, attempts, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000)
    }
}

/// Embed `text`, retrying failed requests under `policy`
pub async fn embed_with_retry(
    oracle: &dyn Oracle,
    text: &str,
    policy: RetryPolicy,
) -> Result<Vec<f32>, LlmError> {
    policy.run(|| oracle.get_vector(text)).await
}
