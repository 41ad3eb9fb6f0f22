//! HTTP retry wrapper with 429/5xx handling and Retry-After support
//!
//! Retry, backoff and rate-limit handling belong to the transport layer, not
//! to the engines above it. `send_with_retry` wraps a `RequestBuilder` with
//! exponential backoff plus jitter on 429 and 5xx responses, honoring a
//! numeric `Retry-After` header when the server sends one. Non-retryable
//! statuses pass straight through.

use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Bounds for the retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given attempt, with 10-30% jitter to
    /// avoid thundering-herd retries, capped at `max_delay_ms`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2f64.powi(attempt as i32);
        let capped = base.min(self.max_delay_ms as f64);
        let jitter = capped * (0.1 + rand::random::<f64>() * 0.2);
        Duration::from_millis((capped + jitter) as u64)
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Parse a numeric `Retry-After` value, capped at five minutes. HTTP-date
/// values are ignored; numeric seconds cover the Drive API's behavior.
fn retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get("retry-after")?.to_str().ok()?;
    let secs: u64 = value.parse().ok()?;
    Some(Duration::from_secs(secs.min(300)))
}

/// Send a request, retrying on 429/5xx up to the policy's attempt bound.
///
/// The builder is cloned per attempt; a request whose body cannot be cloned
/// (streaming) is sent exactly once.
pub async fn send_with_retry(
    builder: RequestBuilder,
    policy: &RetryPolicy,
) -> reqwest::Result<Response> {
    let mut response = match builder.try_clone() {
        Some(first) => first.send().await?,
        None => return builder.send().await,
    };

    for attempt in 0..policy.max_retries {
        if !is_retryable(response.status()) {
            break;
        }
        let delay = retry_after(&response).unwrap_or_else(|| policy.backoff_delay(attempt));
        debug!(
            "HTTP {} from {}; retry {}/{} after {:?}",
            response.status(),
            response.url(),
            attempt + 1,
            policy.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
        match builder.try_clone() {
            Some(retry) => response = retry.send().await?,
            None => break,
        }
    }

    Ok(response)
}
