//! HTTP transport using hyper-util.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body::Frame;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, BodyStream, Empty, Full, StreamBody};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::ServiceExt;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::config::ClientConfig;
use crate::connector::https_connector;
use crate::{Body, Error, HttpClient, Request, RequestBody, Response, Result};

/// Type-erased service at any point of the middleware chain.
pub type BoxedService = BoxCloneService<Request, Response<Body>, Error>;

/// Future type for Tower Service implementations.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Body>>> + Send + 'static>>;

type TransportBody = BoxBody<Bytes, Error>;

// ============================================================================
// Hyper Transport
// ============================================================================

/// One HTTP exchange per call over a pooled hyper client.
///
/// The per-attempt timeout covers everything up to the response headers; the
/// body is handed back as a stream and is not bounded by it.
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, TransportBody>,
    timeout: Duration,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport from the client configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let connector = https_connector(config.connect_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self {
            inner,
            timeout: config.timeout,
        }
    }

    fn build_hyper_request(request: Request) -> Result<http::Request<TransportBody>> {
        let (method, url, headers, body, extensions) = request.into_parts();

        let body = match body {
            RequestBody::Empty => Empty::<Bytes>::new().map_err(|never| match never {}).boxed(),
            RequestBody::Bytes(bytes) => Full::new(bytes).map_err(|never| match never {}).boxed(),
            RequestBody::Stream(stream) => StreamBody::new(stream.map_ok(Frame::data)).boxed(),
        };

        let mut http_request = http::Request::builder()
            .method(http::Method::from(method))
            .uri(url.as_str())
            .body(body)
            .map_err(|e| Error::invalid_argument(e.to_string()))?;

        *http_request.headers_mut() = headers;
        *http_request.extensions_mut() = extensions;

        Ok(http_request)
    }

    async fn send(&self, request: Request) -> Result<Response<Body>> {
        let hyper_request = Self::build_hyper_request(request)?;

        let response = tokio::time::timeout(self.timeout, self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let (parts, body) = response.into_parts();
        let chunks = TryStreamExt::map_err(BodyStream::new(body), |e| {
            Error::connection(e.to_string())
        })
        .try_filter_map(|frame| async move { Ok(frame.into_data().ok()) });

        Ok(Response::new(
            parts.status.as_u16(),
            parts.headers,
            Body::new(chunks),
        ))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = match std::error::Error::source(&err) {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        };

        let lower = msg.to_lowercase();
        if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl HttpClient for HyperTransport {
    async fn execute(&self, request: Request) -> Result<Response<Body>> {
        self.send(request).await
    }
}

impl Service<Request> for HyperTransport {
    type Response = Response<Body>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.send(request).await })
    }
}

// ============================================================================
// Adapters
// ============================================================================

/// Drives any [`HttpClient`] as a tower service.
pub(crate) struct ClientService<C> {
    client: Arc<C>,
}

// Cloning shares the client, so `C` itself need not be `Clone`.
impl<C> Clone for ClientService<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C> ClientService<C> {
    pub(crate) fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl<C> Service<Request> for ClientService<C>
where
    C: HttpClient + 'static,
{
    type Response = Response<Body>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = Arc::clone(&self.client);
        Box::pin(async move { client.execute(request).await })
    }
}

/// Thread-safe handle to a [`BoxedService`].
///
/// `BoxCloneService` is not `Sync`, so the chain is kept behind a mutex and
/// cloned out for each call; the lock is never held while a request runs.
#[derive(Clone)]
pub(crate) struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    pub(crate) fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    pub(crate) fn call(&self, request: Request) -> ServiceFuture {
        let service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.oneshot(request).await })
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use http::HeaderValue;
    use url::Url;

    use super::*;
    use crate::Method;

    #[test]
    fn builds_hyper_request_with_headers_and_extensions() {
        #[derive(Debug, Clone, PartialEq)]
        struct Marker(u8);

        let url = Url::parse("https://example.com/db/doc?rev=1-a").expect("url");
        let request = Request::builder(Method::Put, url)
            .header("if-match", HeaderValue::from_static("1-a"))
            .body(Bytes::from_static(b"{}"))
            .extension(Marker(7))
            .build();

        let_assert!(Ok(hyper_request) = HyperTransport::build_hyper_request(request));
        check!(hyper_request.method() == http::Method::PUT);
        check!(hyper_request.uri() == "https://example.com/db/doc?rev=1-a");
        check!(hyper_request.headers()["if-match"] == "1-a");
        check!(hyper_request.extensions().get::<Marker>() == Some(&Marker(7)));
    }
}
