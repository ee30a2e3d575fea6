//! The call policy every capability request goes through: a per-attempt
//! timeout, bounded retry with exponential backoff, then the caller's own
//! fallback.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use brain_common::{BrainError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{LlmClient, LlmRequest, LlmResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallPolicy {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 1,
            initial_delay_ms: 500,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl CallPolicy {
    /// Policy with no backoff delay, for tests and local mocks.
    pub fn immediate(timeout_ms: u64, max_retries: u32) -> Self {
        Self {
            timeout_ms,
            max_retries,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Run `op` under this policy.
    ///
    /// Each attempt is bounded by `timeout_ms`. Timeouts and transient
    /// provider errors are retried up to `max_retries` times; anything else
    /// is returned immediately.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let outcome =
                match tokio::time::timeout(Duration::from_millis(self.timeout_ms), op()).await {
                    Ok(result) => result,
                    Err(_) => Err(BrainError::Timeout(self.timeout_ms)),
                };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if attempt >= self.max_retries || !is_retryable(&err) {
                return Err(err);
            }

            let error_msg = err.to_string();
            let delay = parse_retry_after(&error_msg)
                .map(|d| d.min(self.max_delay_ms))
                .unwrap_or_else(|| self.compute_delay(attempt));

            warn!(
                call = label,
                attempt = attempt + 1,
                max_retries = self.max_retries,
                delay_ms = delay,
                error = %error_msg,
                "Retrying capability call"
            );

            tokio::time::sleep(Duration::from_millis(delay)).await;
            attempt += 1;
        }
    }

    fn compute_delay(&self, attempt: u32) -> u64 {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let jitter = (base * 0.1 * rand_jitter(attempt)) as u64;
        let delay = (base as u64).saturating_add(jitter);
        delay.min(self.max_delay_ms)
    }
}

fn is_retryable(err: &BrainError) -> bool {
    match err {
        BrainError::Timeout(_) => true,
        BrainError::Capability(msg) => match status_code(msg) {
            Some(code) => code == 429 || (500..600).contains(&code),
            None => {
                let lower = msg.to_lowercase();
                [
                    "rate limit",
                    "server error",
                    "bad gateway",
                    "service unavailable",
                    "gateway timeout",
                    "request failed",
                ]
                .iter()
                .any(|phrase| lower.contains(phrase))
            }
        },
        _ => false,
    }
}

/// HTTP status in a provider error: the code leading the message
/// (`503 Service Unavailable`) or following `error`, `HTTP` or `status`
/// (`OpenAI API error 429 ...`, `HTTP 503: ...`).
fn status_code(msg: &str) -> Option<u16> {
    fn code(word: &str) -> Option<u16> {
        let word = word.trim_end_matches([':', ',', ';']);
        if word.len() != 3 {
            return None;
        }
        word.parse().ok().filter(|c| (100..600).contains(c))
    }

    let words: Vec<&str> = msg.split_whitespace().collect();
    if let Some(leading) = words.first().and_then(|w| code(w)) {
        return Some(leading);
    }
    words.windows(2).find_map(|pair| {
        let key = pair[0].to_ascii_lowercase();
        if matches!(key.as_str(), "error" | "http" | "status") {
            code(pair[1])
        } else {
            None
        }
    })
}

fn parse_retry_after(error_msg: &str) -> Option<u64> {
    let lower = error_msg.to_lowercase();
    let pos = lower.find("retry-after")?;
    for word in error_msg[pos..].split_whitespace().skip(1) {
        let cleaned = word.trim_end_matches(|c: char| !c.is_ascii_digit());
        if let Ok(secs) = cleaned.parse::<u64>() {
            return Some(secs * 1000);
        }
    }
    None
}

/// Deterministic jitter in [0, 1) derived from the attempt number.
fn rand_jitter(attempt: u32) -> f64 {
    let x = attempt.wrapping_mul(2654435761);
    (x % 100) as f64 / 100.0
}

/// An [`LlmClient`] that applies a [`CallPolicy`] to every request.
pub struct RetryingClient<T: LlmClient> {
    inner: T,
    policy: CallPolicy,
}

impl<T: LlmClient> RetryingClient<T> {
    pub fn new(inner: T, policy: CallPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &CallPolicy {
        &self.policy
    }
}

#[async_trait]
impl<T: LlmClient> LlmClient for RetryingClient<T> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let model = self.inner.model_name().to_string();
        self.policy
            .run(&model, || self.inner.complete(request.clone()))
            .await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, with_call_policy};
    use crate::mock::ScriptedClient;
    use std::sync::Arc;

    #[test]
    fn default_policy_retries_once() {
        let policy = CallPolicy::default();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.timeout_ms, 30_000);
        assert!((policy.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn retryable_error_detection() {
        assert!(is_retryable(&BrainError::Capability(
            "OpenAI API error 429 Too Many Requests: rate limit exceeded".into()
        )));
        assert!(is_retryable(&BrainError::Capability(
            "Anthropic API error 500 Internal Server Error".into()
        )));
        assert!(is_retryable(&BrainError::Timeout(100)));
        assert!(!is_retryable(&BrainError::Capability(
            "API error 401 Unauthorized".into()
        )));
        assert!(!is_retryable(&BrainError::Tool("503".into())));
    }

    #[test]
    fn status_codes_are_matched_as_codes() {
        assert!(is_retryable(&BrainError::Capability("HTTP 503: unavailable".into())));
        assert!(is_retryable(&BrainError::Capability(
            "OpenAI request failed: error sending request".into()
        )));
        // numbers elsewhere in the message are not status codes
        assert!(!is_retryable(&BrainError::Capability(
            "max_tokens 1500 exceeds limit (400)".into()
        )));
        assert!(!is_retryable(&BrainError::Capability(
            "OpenAI API error 400 Bad Request: context of 5000 tokens".into()
        )));
        assert_eq!(status_code("Anthropic API error 529 Overloaded: busy"), Some(529));
        assert_eq!(status_code("max_tokens 1500 exceeds limit (400)"), None);
    }

    #[test]
    fn parse_retry_after_from_error() {
        let msg = "429 Too Many Requests, Retry-After: 5";
        assert_eq!(parse_retry_after(msg), Some(5000));
        assert_eq!(parse_retry_after("429 Too Many Requests"), None);
    }

    #[test]
    fn compute_delay_respects_max() {
        let policy = CallPolicy {
            max_retries: 5,
            initial_delay_ms: 500,
            max_delay_ms: 2000,
            backoff_multiplier: 10.0,
            ..Default::default()
        };
        assert!(policy.compute_delay(5) <= 2000);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let client = Arc::new(
            ScriptedClient::new()
                .fail("OpenAI API error 503 Service Unavailable")
                .reply_text("recovered"),
        );
        let retrying = RetryingClient::new(client.clone(), CallPolicy::immediate(1_000, 1));

        let response = retrying.complete(LlmRequest::default()).await.unwrap();
        assert_eq!(response.content, "recovered");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let client = Arc::new(
            ScriptedClient::new()
                .fail("503 Service Unavailable")
                .fail("503 Service Unavailable")
                .reply_text("too late"),
        );
        let retrying = RetryingClient::new(client.clone(), CallPolicy::immediate(1_000, 1));

        assert!(retrying.complete(LlmRequest::default()).await.is_err());
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let client = Arc::new(
            ScriptedClient::new()
                .fail("API error 401 Unauthorized")
                .reply_text("unused"),
        );
        let retrying = RetryingClient::new(client.clone(), CallPolicy::immediate(1_000, 1));

        assert!(retrying.complete(LlmRequest::default()).await.is_err());
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn slow_attempt_times_out() {
        let client = Arc::new(
            ScriptedClient::new()
                .with_latency(Duration::from_millis(200))
                .reply_text("slow")
                .reply_text("slow"),
        );
        let retrying = RetryingClient::new(client.clone(), CallPolicy::immediate(20, 1));

        let err = retrying.complete(LlmRequest::default()).await.unwrap_err();
        assert!(matches!(err, BrainError::Timeout(20)));
    }

    #[tokio::test]
    async fn queueing_for_a_permit_does_not_count_against_the_timeout() {
        let base = Arc::new(
            ScriptedClient::new()
                .with_latency(Duration::from_millis(100))
                .reply_text("one")
                .reply_text("two")
                .reply_text("three"),
        );
        let config = LlmConfig {
            max_concurrent_requests: 1,
            policy: CallPolicy::immediate(150, 1),
            ..Default::default()
        };
        let client = with_call_policy(base.clone(), &config);

        let (a, b, c) = tokio::join!(
            client.complete(LlmRequest::default()),
            client.complete(LlmRequest::default()),
            client.complete(LlmRequest::default()),
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert!(c.is_ok());
        // no attempt was abandoned while waiting in the queue
        assert_eq!(base.call_count(), 3);
    }
}
