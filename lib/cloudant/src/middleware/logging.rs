//! Request/response logging middleware.
//!
//! Every attempt runs inside an `http_request` span carrying the operation
//! name, method and path; the server's request ID is recorded on the span
//! once the response arrives. Query strings and headers are only logged at
//! debug level, with credentials masked.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE, Entry, HeaderValue, SET_COOKIE};
use tower::{Layer, Service};
use tracing::{Instrument, Level, Span, debug, field, info, span, warn};

use crate::{Body, Error, OperationName, Request, Response, Result};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```ignore
/// use cloudant::middleware::LoggingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::debug())
///     .service(transport);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (request/response headers, credentials redacted).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response<Body>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let method = request.method();
        let path = request.url().path().to_string();
        let operation = request
            .extensions()
            .get::<OperationName>()
            .map_or("request", |name| name.0);
        let level = self.level;

        let span = span!(
            Level::INFO,
            "http_request",
            operation,
            %method,
            path,
            request_id = field::Empty,
        );

        // Keep the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(
            async move {
                let start = Instant::now();
                if level == LogLevel::Debug {
                    debug!(
                        query = request.url().query().unwrap_or_default(),
                        headers = ?redacted(request.headers()),
                        body_len = ?request.body().len(),
                        "sending request"
                    );
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => {
                        if let Some(id) = response.header(REQUEST_ID) {
                            Span::current().record("request_id", id);
                        }
                        log_status(response.status(), elapsed_ms);
                        if level == LogLevel::Debug {
                            debug!(headers = ?redacted(response.headers()), "response headers");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "request failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Request correlation header set by CouchDB and Cloudant.
const REQUEST_ID: &str = "x-couch-request-id";

/// Success and expected client answers (a 404 on `HEAD` is how existence is
/// checked) stay at info/debug; throttling and server faults are warnings.
fn log_status(status: u16, elapsed_ms: u64) {
    match status {
        200..=399 => info!(status, elapsed_ms, "request completed"),
        429 => warn!(status, elapsed_ms, "request throttled"),
        500.. => warn!(status, elapsed_ms, "server error"),
        _ => debug!(status, elapsed_ms, "request rejected"),
    }
}

/// Copy of `headers` with credentials masked.
fn redacted(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    for name in [AUTHORIZATION, COOKIE, SET_COOKIE] {
        if let Entry::Occupied(mut entry) = headers.entry(name) {
            entry.insert(HeaderValue::from_static("[redacted]"));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn layer_levels() {
        check!(LoggingLayer::new().level == LogLevel::Info);
        check!(LoggingLayer::debug().level == LogLevel::Debug);
    }

    #[test]
    fn credentials_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("AuthSession=secret"));
        headers.insert(SET_COOKIE, HeaderValue::from_static("AuthSession=next; Max-Age=600"));
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let shown = redacted(&headers);

        check!(shown[COOKIE] == "[redacted]");
        check!(shown[SET_COOKIE] == "[redacted]");
        check!(shown["accept"] == "application/json");
        check!(!shown.contains_key(AUTHORIZATION));
    }
}
