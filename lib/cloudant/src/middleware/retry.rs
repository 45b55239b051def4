//! Retry middleware for HTTP requests.
//!
//! [`RetryPolicy`] plugs into tower's [`RetryLayer`](tower::retry::RetryLayer).
//! It re-dispatches on transport failures, timeouts, 429 and the transient
//! 5xx statuses, sleeping for an exponential backoff with full jitter, or for
//! the server's `Retry-After` when that fits within the maximum backoff.

use std::pin::Pin;
use std::time::{Duration, SystemTime};

use http::HeaderMap;
use http::header::RETRY_AFTER;
use rand::Rng;
use tokio::time::{Instant, Sleep};
use tower::retry::Policy;
use tracing::debug;

use crate::{Body, Error, Request, Response};

/// Point in time after which no further attempt may start.
///
/// Set by the client on each request when an overall deadline applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallDeadline(pub Instant);

/// Retry budget and backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum retries after the first attempt.
    pub max_retries: u32,
    /// Lower bound of every computed delay.
    pub min_backoff: Duration,
    /// Upper bound of every delay, computed or server-provided.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (zero based): uniform over
    /// `[min, min(max, min * 2^attempt)]`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        let ceiling = self
            .min_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff);
        if ceiling <= self.min_backoff {
            return self.min_backoff;
        }
        rand::rng().random_range(self.min_backoff..=ceiling)
    }
}

/// Why an attempt is being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
enum Trigger {
    #[display("status {_0}")]
    Status(u16),
    #[display("timeout")]
    Timeout,
    #[display("transport error")]
    Transport,
}

/// Retry policy with exponential backoff and full jitter.
///
/// Every call starts from a fresh copy of the policy, so the attempt counter
/// is per request. Requests with a streamed body cannot be replayed and are
/// never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    attempt: u32,
}

impl RetryPolicy {
    /// Create a retry policy.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    fn trigger(result: &Result<Response<Body>, Error>) -> Option<Trigger> {
        match result {
            Ok(response) => {
                Self::is_retryable_status(response.status()).then(|| Trigger::Status(response.status()))
            }
            Err(error) if error.is_timeout() => Some(Trigger::Timeout),
            Err(error) if error.is_connection() => Some(Trigger::Transport),
            Err(_) => None,
        }
    }

    /// Returns `true` for statuses worth another attempt.
    fn is_retryable_status(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    fn delay(&self, result: &Result<Response<Body>, Error>) -> Duration {
        let server_delay = match result {
            Ok(response) if matches!(response.status(), 429 | 503) => {
                parse_retry_after(response.headers())
            }
            _ => None,
        };
        server_delay
            .filter(|delay| *delay <= self.config.max_backoff)
            .unwrap_or_else(|| self.config.backoff(self.attempt))
    }
}

impl Policy<Request, Response<Body>, Error> for RetryPolicy {
    type Future = Pin<Box<Sleep>>;

    fn retry(
        &mut self,
        request: &mut Request,
        result: &mut Result<Response<Body>, Error>,
    ) -> Option<Self::Future> {
        if self.attempt >= self.config.max_retries {
            return None;
        }
        let trigger = Self::trigger(result)?;
        let delay = self.delay(result);

        if let Some(CallDeadline(deadline)) = request.extensions().get::<CallDeadline>()
            && Instant::now() + delay >= *deadline
        {
            debug!(%trigger, delay_ms = delay.as_millis(), "retry skipped, deadline too close");
            return None;
        }

        if let Ok(response) = result {
            response.body_mut().close();
        }

        self.attempt += 1;
        debug!(
            attempt = self.attempt,
            max_retries = self.config.max_retries,
            delay_ms = delay.as_millis(),
            %trigger,
            url = %request.url(),
            "retrying request"
        );
        Some(Box::pin(tokio::time::sleep(delay)))
    }

    fn clone_request(&mut self, request: &Request) -> Option<Request> {
        request.try_clone()
    }
}

/// Read `Retry-After` as delta-seconds or an HTTP-date.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let date = httpdate::parse_http_date(value).ok()?;
    Some(date.duration_since(SystemTime::now()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use bytes::Bytes;
    use http::HeaderValue;
    use url::Url;

    use super::*;
    use crate::{Method, RequestBody};

    fn config() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }

    fn response(status: u16) -> Result<Response<Body>, Error> {
        Ok(Response::new(status, HeaderMap::new(), Body::empty()))
    }

    fn request() -> Request {
        Request::builder(Method::Post, Url::parse("http://localhost/db/_find").expect("url"))
            .body(Bytes::from_static(b"{}"))
            .build()
    }

    #[test]
    fn retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            check!(RetryPolicy::is_retryable_status(status));
        }
        for status in [200, 201, 400, 401, 404, 409, 412, 501] {
            check!(!RetryPolicy::is_retryable_status(status));
        }
    }

    #[test]
    fn retryable_errors() {
        check!(RetryPolicy::trigger(&Err(Error::Timeout)) == Some(Trigger::Timeout));
        check!(RetryPolicy::trigger(&Err(Error::connection("reset"))) == Some(Trigger::Transport));
        check!(RetryPolicy::trigger(&Err(Error::invalid_argument("db"))).is_none());
    }

    #[test]
    fn backoff_stays_within_bounds() {
        let config = config();
        for attempt in 0..40 {
            let delay = config.backoff(attempt);
            check!(delay >= config.min_backoff);
            check!(delay <= config.max_backoff);
        }
        check!(config.backoff(0) == config.min_backoff);
    }

    #[test]
    fn retry_after_seconds_wins_within_max() {
        let policy = RetryPolicy::new(config());
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("1"));
        let result = Ok(Response::new(429, headers, Body::empty()));

        check!(policy.delay(&result) == Duration::from_secs(1));
    }

    #[test]
    fn retry_after_beyond_max_is_ignored() {
        let policy = RetryPolicy::new(config());
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));
        let result = Ok(Response::new(503, headers, Body::empty()));

        let delay = policy.delay(&result);
        check!(delay >= Duration::from_millis(100));
        check!(delay <= Duration::from_secs(2));
    }

    #[test]
    fn retry_after_http_date() {
        let when = SystemTime::now() + Duration::from_secs(30);
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_str(&httpdate::fmt_http_date(when)).expect("header"),
        );

        let delay = parse_retry_after(&headers).expect("parsed");
        check!(delay <= Duration::from_secs(30));
        check!(delay >= Duration::from_secs(28));
    }

    #[tokio::test]
    async fn stops_after_budget() {
        let mut policy = RetryPolicy::new(config());
        let mut request = request();

        check!(policy.retry(&mut request, &mut response(503)).is_some());
        check!(policy.retry(&mut request, &mut response(503)).is_some());
        check!(policy.retry(&mut request, &mut response(503)).is_none());
    }

    #[tokio::test]
    async fn never_retries_success_or_client_errors() {
        let mut policy = RetryPolicy::new(config());
        let mut request = request();

        check!(policy.retry(&mut request, &mut response(200)).is_none());
        check!(policy.retry(&mut request, &mut response(404)).is_none());
        check!(policy.retry(&mut request, &mut response(401)).is_none());
    }

    #[tokio::test]
    async fn deadline_blocks_retry() {
        let mut policy = RetryPolicy::new(config());
        let mut request = request();
        request
            .extensions_mut()
            .insert(CallDeadline(Instant::now() + Duration::from_millis(50)));

        check!(policy.retry(&mut request, &mut response(503)).is_none());
    }

    #[test]
    fn streamed_bodies_are_not_cloned() {
        let mut policy = RetryPolicy::new(config());
        let stream: crate::ByteStream =
            Box::pin(futures_util::stream::iter(vec![Ok(Bytes::from_static(b"[]"))]));
        let request = Request::builder(Method::Post, Url::parse("http://localhost/db/_bulk_docs").expect("url"))
            .body(RequestBody::Stream(stream))
            .build();

        check!(policy.clone_request(&request).is_none());
        check!(policy.clone_request(&self::request()).is_some());
    }
}
