//! Operation descriptors.
//!
//! An [`Operation`] describes one call against the service: its name, method,
//! path template with parameters, query parameters, extra headers and body.
//! [`Operation::into_request`] validates and assembles it into a [`Request`].
//!
//! Validation errors recorded while the descriptor is being built are held
//! until assembly, where they are reported in a fixed order: missing or empty
//! required inputs first, then path segment problems, then body encoding
//! failures. Nothing is sent when any of them is present.

use std::marker::PhantomData;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use http::header::{
    ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};
use serde::Serialize;
use url::Url;

use crate::request::ByteStream;
use crate::{
    ContentType, Error, Method, PathTemplate, Request, RequestBody, ResponseMode, Result,
    ToQueryPairs, gzip, gzip_stream, to_json,
};

/// Name of the operation that produced a request, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationName(pub &'static str);

impl std::fmt::Display for OperationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Client-wide settings applied while assembling every request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Gzip-compress JSON request bodies.
    pub gzip: bool,
    /// `User-Agent` header value.
    pub user_agent: Option<HeaderValue>,
    /// Spool streamed bodies of up to this many bytes so they can be retried.
    pub spool_limit: Option<usize>,
}

enum OperationBody {
    None,
    Json(Bytes),
    Raw { bytes: Bytes, content_type: HeaderValue },
    Stream { stream: ByteStream, content_type: HeaderValue, compressible: bool },
}

/// A single service call, typed by its [`ResponseMode`].
///
/// # Example
///
/// ```
/// use cloudant_core::{Json, Method, Operation, RequestOptions};
///
/// # async fn demo() -> cloudant_core::Result<()> {
/// let operation =
///     Operation::<Json<serde_json::Value>>::new("getDocument", Method::Get, "/{db}/{doc_id}")
///         .path("db", "animals")
///         .path("doc_id", "zebra")
///         .query_param("revs", true);
///
/// let base = url::Url::parse("https://example.cloudant.com").unwrap();
/// let request = operation.into_request(&base, &RequestOptions::default()).await?;
/// assert_eq!(request.url().as_str(), "https://example.cloudant.com/animals/zebra?revs=true");
/// # Ok(())
/// # }
/// ```
pub struct Operation<M> {
    name: &'static str,
    method: Method,
    template: PathTemplate,
    path_params: Vec<(&'static str, String)>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    custom_headers: HeaderMap,
    accept: Option<HeaderValue>,
    body: OperationBody,
    invalid: Option<Error>,
    encode: Option<Error>,
    mode: PhantomData<fn() -> M>,
}

impl<M: ResponseMode> Operation<M> {
    /// Start describing an operation.
    #[must_use]
    pub fn new(name: &'static str, method: Method, template: &'static str) -> Self {
        Self {
            name,
            method,
            template: PathTemplate::new(template),
            path_params: Vec::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            custom_headers: HeaderMap::new(),
            accept: None,
            body: OperationBody::None,
            invalid: None,
            encode: None,
            mode: PhantomData,
        }
    }

    /// Operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Bind a path parameter. Empty values are rejected at assembly.
    #[must_use]
    pub fn path(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.path_params.push((name, value.into()));
        self
    }

    /// Record that a required non-path input is missing.
    #[must_use]
    pub fn require(mut self, name: &'static str, present: bool) -> Self {
        if !present && self.invalid.is_none() {
            self.invalid = Some(Error::invalid_argument(name));
        }
        self
    }

    /// Append every query parameter produced by `params`.
    #[must_use]
    pub fn query<Q: ToQueryPairs + ?Sized>(mut self, params: &Q) -> Self {
        match params.to_query_pairs() {
            Ok(pairs) => self.query.extend(pairs),
            Err(e) => self.record_encode(e),
        }
        self
    }

    /// Append a single query parameter.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Set a header when `value` is present.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: Option<&str>) -> Self {
        let Some(value) = value else {
            return self;
        };
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(_) => {
                if self.invalid.is_none() {
                    self.invalid = Some(Error::invalid_argument(format!(
                        "{name}: value is not a valid header"
                    )));
                }
            }
        }
        self
    }

    /// Caller-supplied headers.
    ///
    /// They are merged after every header the operation sets, replacing
    /// values of the same name. Credentials are attached later still, so an
    /// `Authorization` or `Cookie` given here is overwritten when the client
    /// authenticates.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.custom_headers.extend(headers);
        self
    }

    /// Override the `Accept` header implied by the response mode.
    #[must_use]
    pub fn accept(mut self, content_type: ContentType) -> Self {
        self.accept = Some(HeaderValue::from_static(content_type.as_str()));
        self
    }

    /// Serialize `body` as the JSON request body.
    #[must_use]
    pub fn json_body<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match to_json(&body) {
            Ok(bytes) => self.body = OperationBody::Json(bytes),
            Err(e) => self.record_encode(Error::encode(e.to_string())),
        }
        self
    }

    /// Send `bytes` as-is with the given content type.
    #[must_use]
    pub fn raw_body(mut self, bytes: Bytes, content_type: &str) -> Self {
        match HeaderValue::from_str(content_type) {
            Ok(content_type) => self.body = OperationBody::Raw { bytes, content_type },
            Err(_) => {
                if self.invalid.is_none() {
                    self.invalid = Some(Error::invalid_argument("content_type"));
                }
            }
        }
        self
    }

    /// Stream a JSON body supplied by the caller.
    #[must_use]
    pub fn stream_body(mut self, stream: ByteStream) -> Self {
        self.body = OperationBody::Stream {
            stream,
            content_type: HeaderValue::from_static(ContentType::Json.as_str()),
            compressible: true,
        };
        self
    }

    fn record_encode(&mut self, error: Error) {
        if self.encode.is_none() {
            self.encode = Some(error);
        }
    }

    /// Validate the descriptor and assemble the request.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for missing or empty required inputs,
    ///   dot path segments, or a streamed body larger than the spool limit
    /// - an encode error if the body or query parameters could not be encoded
    pub async fn into_request(self, base_url: &Url, options: &RequestOptions) -> Result<Request> {
        if let Some(error) = self.invalid {
            return Err(error);
        }
        let path = self.template.resolve(&self.path_params)?;
        if let Some(error) = self.encode {
            return Err(error);
        }

        let mut url = base_url.clone();
        let joined = format!("{}{path}", base_url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);

        let accept = self
            .accept
            .unwrap_or_else(|| HeaderValue::from_static(M::ACCEPT));
        let mut builder = Request::builder(self.method, url)
            .query_pairs(self.query)
            .header(ACCEPT, accept)
            .extension(OperationName(self.name))
            .extension(self.template);
        if M::BUFFERED {
            builder = builder.header(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        }
        if let Some(user_agent) = &options.user_agent {
            builder = builder.header(USER_AGENT, user_agent.clone());
        }

        builder = match self.body {
            OperationBody::None => builder,
            OperationBody::Json(bytes) => {
                let builder = builder.header(
                    CONTENT_TYPE,
                    HeaderValue::from_static(ContentType::Json.as_str()),
                );
                if options.gzip {
                    builder
                        .header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
                        .body(gzip(&bytes)?)
                } else {
                    builder.body(bytes)
                }
            }
            OperationBody::Raw {
                bytes,
                content_type,
            } => builder.header(CONTENT_TYPE, content_type).body(bytes),
            OperationBody::Stream {
                stream,
                content_type,
                compressible,
            } => {
                let builder = builder.header(CONTENT_TYPE, content_type);
                let compress = options.gzip && compressible;
                let builder = if compress {
                    builder.header(CONTENT_ENCODING, HeaderValue::from_static("gzip"))
                } else {
                    builder
                };
                match options.spool_limit {
                    Some(limit) => {
                        let spooled = spool(stream, limit).await?;
                        if compress {
                            builder.body(gzip(&spooled)?)
                        } else {
                            builder.body(spooled)
                        }
                    }
                    None if compress => builder.body(RequestBody::Stream(gzip_stream(stream))),
                    None => builder.body(RequestBody::Stream(stream)),
                }
            }
        };

        Ok(builder
            .headers(self.headers)
            .headers(self.custom_headers)
            .build())
    }
}

impl<M> std::fmt::Debug for Operation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Buffer a stream so it can be replayed, failing once it exceeds `limit` bytes.
async fn spool(mut stream: ByteStream, limit: usize) -> Result<Bytes> {
    let mut spooled = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if spooled.len() + chunk.len() > limit {
            return Err(Error::invalid_argument(format!(
                "body: streamed body exceeds the {limit} byte spool limit"
            )));
        }
        spooled.extend_from_slice(&chunk);
    }
    Ok(spooled.freeze())
}
