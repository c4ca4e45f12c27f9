// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use bijux_screen_model::{Endpoint, Payload, Response, TransportFailure};
use tracing::{instrument, warn};

use crate::ProbeClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// One attempt, no backoff.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_backoff_ms: 0,
        }
    }

    /// Linear backoff slept after the given (1-based) failed attempt.
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Sum of every backoff the policy may sleep.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        // base * (1 + 2 + .. + (n - 1))
        let n = u64::from(self.max_attempts.max(1));
        let steps = n.saturating_mul(n - 1) / 2;
        Duration::from_millis(self.base_backoff_ms.saturating_mul(steps))
    }
}

/// Retries transport failures of the inner client. Answered responses are final.
pub struct RetryingProbe<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: ProbeClient> RetryingProbe<P> {
    #[must_use]
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

}

#[async_trait]
impl<P: ProbeClient> ProbeClient for RetryingProbe<P> {
    fn backend_tag(&self) -> &'static str {
        self.inner.backend_tag()
    }

    #[instrument(
        name = "probe_with_retry",
        skip(self, endpoint, payload),
        fields(endpoint = endpoint.as_str())
    )]
    async fn probe(
        &self,
        endpoint: Endpoint,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<Response, TransportFailure> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.probe(endpoint, payload, timeout).await {
                Ok(mut response) => {
                    response.attempts = attempt;
                    return Ok(response);
                }
                Err(mut failure) => {
                    if attempt >= max_attempts {
                        failure.attempts = attempt;
                        return Err(failure);
                    }
                    warn!(
                        attempt,
                        max_attempts,
                        error = %failure.detail,
                        "probe transport failure, retrying"
                    );
                }
            }
            tokio::time::sleep(self.policy.backoff_after(attempt)).await;
        }
    }
}
