//! Blocking HTTP plumbing for the network adapters: client construction and
//! the retry loop with exponential backoff.
//!
//! Only the one-off price preload retries. Per-day adapters (news,
//! recommendations) make a single attempt so a failure becomes that day's
//! HOLD instead of stalling the run.

use super::circuit_breaker::CircuitBreaker;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use tradesim_core::ProviderError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Retry schedule: `base_delay × 2^(attempt-1)` between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ProviderError::Other(format!("failed to build HTTP client: {e}")))
}

/// Send a request built by `send`, retrying transient failures.
///
/// 403 trips the breaker and stops. 401 stops with an authentication error.
/// 429, other non-success statuses and connect/timeout errors are retried
/// until `policy.max_retries` is exhausted.
pub fn send_with_retry<F>(
    breaker: &CircuitBreaker,
    policy: &RetryPolicy,
    what: &str,
    mut send: F,
) -> Result<Response, ProviderError>
where
    F: FnMut() -> reqwest::Result<Response>,
{
    let mut last_error = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            std::thread::sleep(policy.delay(attempt));
        }
        if !breaker.is_allowed() {
            return Err(ProviderError::CircuitBreakerTripped);
        }

        match send() {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    breaker.record_success();
                    return Ok(resp);
                }
                debug!(service = breaker.service(), %status, attempt, "{what} failed");
                match status {
                    StatusCode::FORBIDDEN => {
                        breaker.trip();
                        return Err(ProviderError::CircuitBreakerTripped);
                    }
                    StatusCode::UNAUTHORIZED => {
                        return Err(ProviderError::Authentication(format!(
                            "{} rejected the credentials for {what}",
                            breaker.service()
                        )));
                    }
                    StatusCode::TOO_MANY_REQUESTS => {
                        breaker.record_failure();
                        let retry_after_secs = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        last_error = Some(ProviderError::RateLimited { retry_after_secs });
                    }
                    _ => {
                        breaker.record_failure();
                        last_error = Some(ProviderError::Other(format!("HTTP {status} for {what}")));
                    }
                }
            }
            Err(e) if e.is_connect() || e.is_timeout() => {
                last_error = Some(ProviderError::Network(e.to_string()));
            }
            Err(e) => return Err(ProviderError::Network(e.to_string())),
        }
    }

    Err(last_error.unwrap_or_else(|| ProviderError::Other("max retries exceeded".into())))
}
