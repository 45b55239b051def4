//! HTTP request building.
//!
//! Requests travel through the middleware chain as [`Request`] values. Use
//! [`Request::builder`] to construct them by hand; operations build them via
//! [`crate::Operation`].
//!
//! # Example
//!
//! ```
//! use cloudant_core::{Method, Request};
//! use http::header::ACCEPT;
//! use http::HeaderValue;
//!
//! let request = Request::builder(Method::Get, "https://example.cloudant.com/db".parse().unwrap())
//!     .header(ACCEPT, HeaderValue::from_static("application/json"))
//!     .query("limit", "10")
//!     .build();
//! ```

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use http::header::{HeaderMap, HeaderValue, IntoHeaderName};
use http::Extensions;

use crate::Method;

/// A stream of request or response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send + Sync>>;

// ============================================================================
// Request Body
// ============================================================================

/// Body of an outgoing request.
#[derive(Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A fully buffered body. Buffered bodies can be replayed on retry.
    Bytes(Bytes),
    /// A caller-provided stream. Streams are consumed once and cannot be replayed.
    Stream(ByteStream),
}

impl RequestBody {
    /// Returns `true` if the body can be sent again on a retry.
    #[must_use]
    pub const fn is_rewindable(&self) -> bool {
        !matches!(self, Self::Stream(_))
    }

    /// Returns a copy of this body, or `None` for streams.
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        match self {
            Self::Empty => Some(Self::Empty),
            Self::Bytes(bytes) => Some(Self::Bytes(bytes.clone())),
            Self::Stream(_) => None,
        }
    }

    /// Size in bytes, when known.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Empty => Some(0),
            Self::Bytes(bytes) => Some(bytes.len()),
            Self::Stream(_) => None,
        }
    }

    /// Returns `true` for [`RequestBody::Empty`] and zero-length buffers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<ByteStream> for RequestBody {
    fn from(stream: ByteStream) -> Self {
        Self::Stream(stream)
    }
}

// ============================================================================
// Request
// ============================================================================

/// An HTTP request with method, URL, headers, body and extensions.
///
/// Extensions carry per-call metadata such as the operation name and the
/// unresolved [`crate::PathTemplate`] for middleware to inspect.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: url::Url,
    headers: HeaderMap,
    body: RequestBody,
    extensions: Extensions,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: url::Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Single header value by name, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Request extensions.
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable access to extensions.
    #[must_use]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Copy this request for a retry attempt. Returns `None` if the body is a stream.
    #[must_use]
    pub fn try_clone(&self) -> Option<Self> {
        Some(Self {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
            extensions: self.extensions.clone(),
        })
    }

    /// Consume into (method, url, headers, body, extensions).
    #[must_use]
    pub fn into_parts(self) -> (Method, url::Url, HeaderMap, RequestBody, Extensions) {
        (
            self.method,
            self.url,
            self.headers,
            self.body,
            self.extensions,
        )
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    url: url::Url,
    headers: HeaderMap,
    body: RequestBody,
    extensions: Extensions,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            extensions: Extensions::new(),
        }
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: impl IntoHeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Merges multiple headers, replacing existing values of the same name.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut last = None;
        for (name, value) in headers {
            let name = match name {
                Some(name) => {
                    last = Some(name.clone());
                    self.headers.insert(name.clone(), value);
                    continue;
                }
                None => last.clone(),
            };
            if let Some(name) = name {
                self.headers.append(name, value);
            }
        }
        self
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Appends multiple query parameters to the URL.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut pairs = pairs.into_iter().peekable();
        if pairs.peek().is_some() {
            let mut query = self.url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(&name, &value);
            }
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Inserts a typed extension.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            extensions: self.extensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use http::header::{ACCEPT, CONTENT_TYPE};

    use super::*;

    fn url() -> url::Url {
        url::Url::parse("https://example.cloudant.com/db").expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::builder(Method::Get, url())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .build();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url().as_str(), "https://example.cloudant.com/db");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert!(request.body().is_empty());
    }

    #[test]
    fn request_builder_with_query() {
        let request = Request::builder(Method::Get, url())
            .query("limit", "10")
            .query("key", "\"a b\"")
            .build();

        assert_eq!(
            request.url().as_str(),
            "https://example.cloudant.com/db?limit=10&key=%22a+b%22"
        );
    }

    #[test]
    fn empty_query_pairs_leave_url_untouched() {
        let request = Request::builder(Method::Get, url())
            .query_pairs(Vec::new())
            .build();

        assert_eq!(request.url().as_str(), "https://example.cloudant.com/db");
    }

    #[test]
    fn buffered_request_can_be_cloned() {
        let body = Bytes::from(r#"{"name":"test"}"#);
        let request = Request::builder(Method::Post, url())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body.clone())
            .extension("postDocument")
            .build();

        let copy = request.try_clone().expect("rewindable");
        assert!(matches!(copy.body(), RequestBody::Bytes(b) if *b == body));
        assert_eq!(copy.extensions().get::<&str>(), Some(&"postDocument"));
        assert_eq!(copy.header("content-type"), Some("application/json"));
    }

    #[test]
    fn streamed_request_cannot_be_cloned() {
        let chunks: ByteStream = Box::pin(stream::iter(vec![Ok(Bytes::from("[]"))]));
        let request = Request::builder(Method::Post, url()).body(chunks).build();

        assert!(!request.body().is_rewindable());
        assert!(request.try_clone().is_none());
        assert_eq!(request.body().len(), None);
    }

    #[test]
    fn headers_merge_replaces() {
        let mut extra = HeaderMap::new();
        extra.insert(ACCEPT, HeaderValue::from_static("multipart/mixed"));

        let request = Request::builder(Method::Get, url())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .headers(extra)
            .build();

        assert_eq!(request.header("accept"), Some("multipart/mixed"));
        assert_eq!(request.headers().get_all(ACCEPT).iter().count(), 1);
    }
}
