use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderValue;

use crate::types::FetchError;

const MAX_RETRY_AFTER_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retryable,
    NonRetryable,
}

pub fn retry_decision_for_status(status: StatusCode) -> RetryDecision {
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        RetryDecision::Retryable
    } else {
        RetryDecision::NonRetryable
    }
}

pub fn retry_delay(attempt: u32, policy: &RetryPolicy, retry_after: Option<&HeaderValue>) -> Duration {
    if let Some(secs) = retry_after
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
    {
        return Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS));
    }
    let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
    let backoff = policy
        .initial_backoff_ms
        .saturating_mul(exponent)
        .min(policy.max_backoff_ms);
    Duration::from_millis(backoff)
}

/// Sends `request`, retrying transient failures with exponential backoff.
///
/// The final response is returned as-is, even when its status is an error;
/// callers decide what a non-success status means.
pub async fn send_with_retry(
    request: reqwest::RequestBuilder,
    policy: &RetryPolicy,
    endpoint: &'static str,
) -> Result<reqwest::Response, FetchError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let Some(cloned) = request.try_clone() else {
            return request
                .send()
                .await
                .map_err(|source| FetchError::Transport { endpoint, source });
        };

        match cloned.send().await {
            Ok(response) => {
                let status = response.status();
                if retry_decision_for_status(status) == RetryDecision::Retryable
                    && attempt < attempts
                {
                    let delay = retry_delay(
                        attempt,
                        policy,
                        response.headers().get(reqwest::header::RETRY_AFTER),
                    );
                    tracing::warn!(
                        endpoint,
                        attempt,
                        attempts,
                        status = status.as_u16(),
                        ?delay,
                        "retrying after status"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Ok(response);
            }
            Err(source) => {
                let transient = source.is_timeout() || source.is_connect();
                if transient && attempt < attempts {
                    let delay = retry_delay(attempt, policy, None);
                    tracing::warn!(
                        endpoint,
                        attempt,
                        attempts,
                        error = %source,
                        ?delay,
                        "retrying after transport error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(FetchError::Transport { endpoint, source });
            }
        }
    }
}
