//! Shared retry utilities.
//!
//! Two policies live here: the forum request policy used by
//! [`send_with_retry`], and the database write policy used when recording
//! sync results. Both are plain [`RetryConfig`] values so callers can pass
//! their own limits instead of relying on module constants.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use tokio::time::Instant;
use uuid::Uuid;

use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use crate::sync::{
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_REQUEST_RETRIES, PERSIST_INITIAL_BACKOFF_MS,
    PERSIST_MAX_RETRIES,
};

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_REQUEST_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Policy for writing sync results back to the database: 1s, 2s, 4s.
    #[must_use]
    pub fn persistence() -> Self {
        let min_delay = Duration::from_millis(PERSIST_INITIAL_BACKOFF_MS);
        let max_delay = min_delay * 2u32.pow(PERSIST_MAX_RETRIES as u32 - 1);
        Self {
            min_delay,
            max_delay,
            max_retries: PERSIST_MAX_RETRIES,
            with_jitter: false,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Short correlation id attached to every log line of one forum request.
#[must_use]
pub fn short_request_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Whether a response status should be retried (throttling or server fault).
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Delay requested by the server, from `Retry-After` (seconds) or
/// Discourse's `extras.wait_seconds` body field.
#[must_use]
pub fn server_retry_delay(response: &HttpResponse) -> Option<Duration> {
    if let Some(secs) = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        return Some(Duration::from_secs(secs));
    }

    let body: serde_json::Value = serde_json::from_slice(&response.body).ok()?;
    let wait = body.get("extras")?.get("wait_seconds")?.as_f64()?;
    (wait.is_finite() && wait >= 0.0).then(|| Duration::from_secs_f64(wait))
}

/// Send a request, retrying throttled and failed attempts with backoff.
///
/// Retries on 429, 5xx and transport errors. A server-supplied delay is
/// honored (capped at `config.max_delay`). Every other response, including
/// 4xx business errors, is returned untouched on the first attempt. When the
/// retry budget runs out, the last response (or transport error) is returned
/// so callers can tell "service unavailable" apart from a real conflict.
pub async fn send_with_retry(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
    config: &RetryConfig,
    request_id: &str,
) -> Result<HttpResponse, HttpError> {
    let mut delays = config.clone().into_backoff().build();
    let method = request.method.as_str();
    let path = request.path();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let started = Instant::now();
        tracing::debug!(request_id, method, path, attempt, "Sending forum request");

        let result = transport.send(request.clone()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let server_delay = match &result {
            Ok(response) => {
                tracing::debug!(
                    request_id,
                    status = response.status,
                    elapsed_ms,
                    "Forum response"
                );
                if !is_retryable_status(response.status) {
                    return result;
                }
                server_retry_delay(response)
            }
            Err(e) => {
                tracing::debug!(request_id, elapsed_ms, error = %e, "Forum transport error");
                None
            }
        };

        let Some(backoff) = delays.next() else {
            tracing::warn!(request_id, method, path, attempt, "Forum request retries exhausted");
            return result;
        };

        let delay = match server_delay {
            Some(requested) => requested.min(config.max_delay).max(backoff),
            None => backoff,
        };

        tracing::warn!(
            request_id,
            status = result.as_ref().ok().map(|r| r.status),
            delay_ms = delay.as_millis() as u64,
            attempt,
            "Forum request failed, backing off"
        );

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, MockTransport};

    const URL: &str = "https://forum.test/categories.json";

    fn get() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: URL.to_string(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    fn response(status: u16, headers: Vec<(&str, &str)>, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.as_bytes().to_vec(),
        }
    }

    fn fast_config(retries: usize) -> RetryConfig {
        RetryConfig::new(Duration::from_secs(1), Duration::from_secs(30), retries).with_jitter(false)
    }

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();

        assert_eq!(config.min_delay, Duration::from_millis(INITIAL_BACKOFF_MS));
        assert_eq!(config.max_delay, Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(config.max_retries, MAX_REQUEST_RETRIES);
        assert!(config.with_jitter);
    }

    #[test]
    fn test_persistence_policy_is_one_two_four_seconds() {
        let config = RetryConfig::persistence();
        assert_eq!(config.max_retries, 3);
        assert!(!config.with_jitter);

        let delays: Vec<Duration> = config.into_backoff().build().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_short_request_id_is_eight_hex_chars() {
        let id = short_request_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(422));
    }

    #[test]
    fn test_server_retry_delay_prefers_header() {
        let resp = response(
            429,
            vec![("Retry-After", "12")],
            r#"{"extras":{"wait_seconds":3}}"#,
        );
        assert_eq!(server_retry_delay(&resp), Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_server_retry_delay_reads_discourse_body() {
        let resp = response(429, vec![], r#"{"errors":["slow down"],"extras":{"wait_seconds":3}}"#);
        assert_eq!(server_retry_delay(&resp), Some(Duration::from_secs(3)));

        let none = response(429, vec![], "not json");
        assert_eq!(server_retry_delay(&none), None);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_throttled_request_and_honors_retry_after() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            URL,
            response(429, vec![("Retry-After", "7")], "{}"),
        );
        transport.push_response(HttpMethod::Get, URL, response(200, vec![], "{}"));

        let started = Instant::now();
        let resp = send_with_retry(&transport, &get(), &fast_config(3), "abcd1234")
            .await
            .expect("second attempt succeeds");

        assert_eq!(resp.status, 200);
        assert_eq!(transport.requests().len(), 2);
        assert!(started.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_failure_after_exhausting_retries() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.push_response(HttpMethod::Get, URL, response(503, vec![], "down"));
        }

        let resp = send_with_retry(&transport, &get(), &fast_config(2), "abcd1234")
            .await
            .expect("last response is returned, not an error");

        assert_eq!(resp.status, 503);
        assert_eq!(resp.body_text(), "down");
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn passes_business_errors_through_without_retry() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            URL,
            response(422, vec![], r#"{"errors":["Title has already been used"]}"#),
        );

        let resp = send_with_retry(&transport, &get(), &fast_config(3), "abcd1234")
            .await
            .expect("422 is a response, not a transport failure");

        assert_eq!(resp.status, 422);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_are_retried_then_returned() {
        let transport = MockTransport::new();

        let err = send_with_retry(&transport, &get(), &fast_config(2), "abcd1234")
            .await
            .expect_err("no mock registered");

        assert!(matches!(err, HttpError::NoMockResponse { .. }));
        assert_eq!(transport.requests().len(), 3);
    }
}
