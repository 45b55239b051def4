//! Authentication middleware.
//!
//! Runs the client's [`Authenticator`] on every attempt, so a retried request
//! picks up a credential refreshed in the meantime. When the authenticator
//! caches credentials that can go stale, a 401 answer drops the rejected
//! credential and the request is replayed exactly once with a fresh one; a
//! second 401 is returned to the caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::{Layer, Service, ServiceExt};
use tracing::debug;

use crate::auth::Authenticator;
use crate::{Body, Error, Request, Response, Result};

/// Layer that attaches credentials to requests.
#[derive(Debug, Clone)]
pub struct AuthLayer {
    authenticator: Arc<dyn Authenticator>,
}

impl AuthLayer {
    /// Create an auth layer around an authenticator.
    #[must_use]
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = Authenticate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Authenticate {
            inner,
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

/// Service that attaches credentials to requests.
#[derive(Debug, Clone)]
pub struct Authenticate<S> {
    inner: S,
    authenticator: Arc<dyn Authenticator>,
}

impl<S> Service<Request> for Authenticate<S>
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

    fn call(&mut self, mut request: Request) -> Self::Future {
        let authenticator = Arc::clone(&self.authenticator);
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let replay = if authenticator.refreshes_on_unauthorized() {
                request.try_clone()
            } else {
                None
            };

            authenticator.authenticate(&mut request).await?;
            let Some(mut replay) = replay else {
                return inner.call(request).await;
            };

            let sent = request.headers().clone();
            let mut response = inner.call(request).await?;
            if response.status() != 401 {
                return Ok(response);
            }

            debug!("credential rejected, refreshing and replaying once");
            response.body_mut().close();
            authenticator.invalidate(&sent);
            authenticator.authenticate(&mut replay).await?;
            inner.ready().await?.call(replay).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert2::check;
    use futures_util::future::BoxFuture;
    use http::header::{AUTHORIZATION, HeaderMap, HeaderValue};
    use url::Url;

    use super::*;
    use crate::Method;

    /// Hands out `Bearer 1`, `Bearer 2`, ... bumping the counter on invalidate.
    #[derive(Debug, Default)]
    struct Rotating {
        generation: AtomicUsize,
        invalidated: AtomicUsize,
    }

    impl Authenticator for Rotating {
        fn authenticate<'a>(&'a self, request: &'a mut Request) -> BoxFuture<'a, Result<()>> {
            let generation = self.generation.load(Ordering::SeqCst) + 1;
            let value = HeaderValue::from_str(&format!("Bearer {generation}")).expect("header");
            request.headers_mut().insert(AUTHORIZATION, value);
            Box::pin(async { Ok(()) })
        }

        fn refreshes_on_unauthorized(&self) -> bool {
            true
        }

        fn invalidate(&self, _rejected: &HeaderMap) {
            self.invalidated.fetch_add(1, Ordering::SeqCst);
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Answers 401 unless the request carries `accepted`.
    fn server(
        accepted: &'static str,
        calls: Arc<AtomicUsize>,
    ) -> tower::util::BoxCloneService<Request, Response<Body>, Error> {
        tower::util::BoxCloneService::new(tower::service_fn(move |request: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            let status = if request.header("authorization") == Some(accepted) {
                200
            } else {
                401
            };
            async move { Ok(Response::new(status, HeaderMap::new(), Body::empty())) }
        }))
    }

    fn request() -> Request {
        Request::builder(Method::Get, Url::parse("http://localhost/db").expect("url")).build()
    }

    #[tokio::test]
    async fn replays_once_after_unauthorized() {
        let authenticator = Arc::new(Rotating::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let service = AuthLayer::new(authenticator.clone()).layer(server("Bearer 2", calls.clone()));

        let response = service.oneshot(request()).await.expect("response");

        check!(response.status() == 200);
        check!(calls.load(Ordering::SeqCst) == 2);
        check!(authenticator.invalidated.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    async fn second_unauthorized_is_returned() {
        let authenticator = Arc::new(Rotating::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let service = AuthLayer::new(authenticator.clone()).layer(server("never", calls.clone()));

        let response = service.oneshot(request()).await.expect("response");

        check!(response.status() == 401);
        check!(calls.load(Ordering::SeqCst) == 2);
    }

    #[tokio::test]
    async fn static_credentials_are_not_replayed() {
        let authenticator: Arc<dyn Authenticator> =
            Arc::new(crate::auth::BearerAuthenticator::new("fixed").expect("authenticator"));
        let calls = Arc::new(AtomicUsize::new(0));
        let service = AuthLayer::new(authenticator).layer(server("never", calls.clone()));

        let response = service.oneshot(request()).await.expect("response");

        check!(response.status() == 401);
        check!(calls.load(Ordering::SeqCst) == 1);
    }
}
