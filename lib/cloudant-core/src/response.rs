//! HTTP response handling.
//!
//! Responses come back from the middleware chain as [`Response<Body>`], where
//! [`Body`] is a single-consumer stream of chunks. Buffered modes collect it;
//! streamed modes hand it to the caller as-is.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use http::HeaderMap;

// ============================================================================
// Body
// ============================================================================

/// Streaming response body.
///
/// The body can be read chunk by chunk with [`Body::next_chunk`], consumed as a
/// [`Stream`], or buffered with [`Body::collect`]. Closing it early releases
/// the underlying connection; closing more than once is a no-op.
pub struct Body {
    stream: Option<Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>>,
}

impl Body {
    /// Wrap a stream of chunks.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = crate::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: Some(Box::pin(stream)),
        }
    }

    /// A body that yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { stream: None }
    }

    /// A body that yields one chunk.
    #[must_use]
    pub fn from_bytes(bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        Self::new(futures_util::stream::once(async move { Ok(bytes) }))
    }

    /// Read the next chunk. Returns `None` once the body is exhausted or closed.
    pub async fn next_chunk(&mut self) -> Option<crate::Result<Bytes>> {
        self.next().await
    }

    /// Stop reading and release the connection.
    pub fn close(&mut self) {
        self.stream = None;
    }

    /// Returns `true` once the body has been closed or fully read.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Buffer the remaining chunks.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the underlying stream.
    pub async fn collect(mut self) -> crate::Result<Bytes> {
        let mut collected = BytesMut::new();
        while let Some(chunk) = self.next().await {
            collected.extend_from_slice(&chunk?);
        }
        Ok(collected.freeze())
    }
}

impl Stream for Body {
    type Item = crate::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(stream) = self.stream.as_mut() else {
            return Poll::Ready(None);
        };
        match stream.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                self.stream = None;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ============================================================================
// Response
// ============================================================================

/// HTTP response with status, headers, and body.
#[derive(Debug, Clone)]
pub struct Response<B = Body> {
    status: u16,
    headers: HeaderMap,
    body: B,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: B) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// `ETag` header with surrounding quotes removed.
    ///
    /// For documents this is the current revision token.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.header("etag").map(|tag| {
            let tag = tag.strip_prefix("W/").unwrap_or(tag);
            tag.trim_matches('"')
        })
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Mutable access to the body.
    #[must_use]
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, HeaderMap, B) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Transform the body with a function.
    pub fn map_body<F, B2>(self, f: F) -> Response<B2>
    where
        F: FnOnce(B) -> B2,
    {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

impl Response<Body> {
    /// Buffer the whole body.
    ///
    /// # Errors
    ///
    /// Returns an error if reading any chunk fails.
    pub async fn collect(self) -> crate::Result<Response<Bytes>> {
        let (status, headers, body) = self.into_parts();
        let body = body.collect().await?;
        Ok(Response::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;

    use super::*;

    #[test]
    fn response_basic() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = Response::new(200, headers, Bytes::from(r#"{"ok":true}"#));

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn etag_strips_quotes() {
        let mut headers = HeaderMap::new();
        headers.insert("etag", HeaderValue::from_static("\"2-7051cbe5c8faecd085a3fa619e6e6337\""));
        let response = Response::new(200, headers, ());

        assert_eq!(response.etag(), Some("2-7051cbe5c8faecd085a3fa619e6e6337"));
    }

    #[test]
    fn response_status_checks() {
        let response = Response::new(404, HeaderMap::new(), Bytes::new());
        assert!(response.is_client_error());

        let response = Response::new(500, HeaderMap::new(), Bytes::new());
        assert!(response.is_server_error());
    }

    #[test]
    fn response_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Ack {
            ok: bool,
        }

        let response = Response::new(200, HeaderMap::new(), Bytes::from(r#"{"ok":true}"#));
        let ok: Ack = response.json().expect("deserialize");
        assert_eq!(ok, Ack { ok: true });
    }

    #[tokio::test]
    async fn body_reads_chunks_in_order() {
        let mut body = Body::new(stream::iter(vec![
            Ok(Bytes::from("{\"a\"")),
            Ok(Bytes::from(":1}")),
        ]));

        assert_eq!(body.next_chunk().await.expect("chunk").expect("ok"), "{\"a\"");
        assert_eq!(body.next_chunk().await.expect("chunk").expect("ok"), ":1}");
        assert!(body.next_chunk().await.is_none());
        assert!(body.is_closed());
    }

    #[tokio::test]
    async fn body_close_is_idempotent() {
        let mut body = Body::from_bytes(Bytes::from("data"));
        body.close();
        body.close();

        assert!(body.is_closed());
        assert!(body.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn body_collect_propagates_errors() {
        let body = Body::new(stream::iter(vec![
            Ok(Bytes::from("partial")),
            Err(crate::Error::connection("reset by peer")),
        ]));

        let err = body.collect().await.expect_err("should fail");
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn response_collect() {
        let response = Response::new(
            200,
            HeaderMap::new(),
            Body::new(stream::iter(vec![Ok(Bytes::from("ab")), Ok(Bytes::from("c"))])),
        );

        let buffered = response.collect().await.expect("collect");
        assert_eq!(buffered.body(), &Bytes::from("abc"));
    }
}
