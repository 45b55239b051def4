//! The Cloudant client and its builder.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderValue};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceBuilder};
use tower_service::Service;
use tracing::debug;
use url::Url;

use crate::auth::{Authentication, Authenticator};
use crate::config::{ClientConfig, ClientConfigBuilder};
use crate::middleware::{
    AuthLayer, CallDeadline, ConcurrencyLimitLayer, LogLevel, LoggingLayer, RetryLayer,
    RetryPolicy,
};
use crate::transport::{BoxedService, ClientService, HyperTransport, SyncService};
use crate::{
    Body, Error, HttpClient, Operation, Request, RequestOptions, Response, ResponseMode, Result,
};

// ============================================================================
// Client
// ============================================================================

struct ClientInner {
    service: SyncService,
    base_url: Url,
    request_options: RequestOptions,
    config: ClientConfig,
    authenticator: Arc<dyn Authenticator>,
    shutdown: CancellationToken,
}

/// Client for the Cloudant and CouchDB HTTP API.
///
/// Cloning is cheap and every clone shares the connection pool, the
/// credential cache and the middleware chain. Every operation is an `async`
/// method taking a typed options record.
///
/// # Example
///
/// ```ignore
/// use cloudant::{Authentication, CloudantClient, GetDocumentOptions};
///
/// let client = CloudantClient::builder()
///     .base_url("https://account.cloudantnosqldb.appdomain.cloud")
///     .authentication(Authentication::iam(api_key))
///     .build()?;
///
/// let doc = client.get_document(&GetDocumentOptions::new("orders", "order-1")).await?;
/// ```
#[derive(Clone)]
pub struct CloudantClient {
    inner: Arc<ClientInner>,
    cancellation: Option<CancellationToken>,
    deadline: Option<Duration>,
    headers: HeaderMap,
}

impl std::fmt::Debug for CloudantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudantClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticator", &self.inner.authenticator)
            .field("config", &self.inner.config)
            .field("deadline", &self.deadline)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl CloudantClient {
    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> CloudantClientBuilder {
        CloudantClientBuilder::default()
    }

    /// The service URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// A handle whose calls abort with [`Error::Cancelled`] once `token` fires.
    ///
    /// The handle shares everything else with `self`.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self.clone()
        }
    }

    /// A handle whose calls fail with [`Error::Timeout`] when they take longer
    /// than `deadline`, retries included.
    #[must_use]
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// A handle adding `headers` to every request it sends.
    ///
    /// They replace same-named headers the operation sets, but never the
    /// credentials: `Authorization` and `Cookie` are attached afterwards by
    /// the configured authentication.
    #[must_use]
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        let mut merged = self.headers.clone();
        merged.extend(headers);
        Self {
            headers: merged,
            ..self.clone()
        }
    }

    /// Close the client.
    ///
    /// In-flight credential refreshes are cancelled and later calls on any
    /// clone fail with [`Error::Cancelled`]. Streamed bodies already handed
    /// out stay readable until their owner closes them.
    pub fn close(&self) {
        debug!(base_url = %self.inner.base_url, "closing client");
        self.inner.shutdown.cancel();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Run one operation through the middleware chain.
    ///
    /// Every service method ends up here. Errors are wrapped with the
    /// operation name.
    ///
    /// # Errors
    ///
    /// Any [`Error`]; see [`Error::kind`] for the classification.
    pub async fn send<M: ResponseMode>(&self, operation: Operation<M>) -> Result<M::Output> {
        let name = operation.name();
        let deadline = self.deadline.or(self.inner.config.deadline);

        let call = async {
            match deadline {
                Some(deadline) => tokio::time::timeout(deadline, self.dispatch(operation, deadline))
                    .await
                    .unwrap_or(Err(Error::Timeout)),
                None => self.dispatch(operation, Duration::MAX).await,
            }
        };
        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        let result = tokio::select! {
            biased;
            () = self.inner.shutdown.cancelled() => Err(Error::Cancelled),
            () = cancelled => Err(Error::Cancelled),
            result = call => result,
        };
        result.map_err(|error| error.in_operation(name))
    }

    async fn dispatch<M: ResponseMode>(
        &self,
        operation: Operation<M>,
        deadline: Duration,
    ) -> Result<M::Output> {
        let mut request = operation
            .headers(self.headers.clone())
            .into_request(&self.inner.base_url, &self.inner.request_options)
            .await?;
        if let Some(at) = Instant::now().checked_add(deadline) {
            request.extensions_mut().insert(CallDeadline(at));
        }
        let response = self.inner.service.call(request).await?;
        M::handle(response).await
    }
}

// ============================================================================
// Builder
// ============================================================================

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Builder for [`CloudantClient`].
///
/// # Example
///
/// ```ignore
/// use cloudant::{Authentication, CloudantClient};
/// use std::time::Duration;
///
/// let client = CloudantClient::builder()
///     .base_url("http://localhost:5984")
///     .authentication(Authentication::session("admin", "pass"))
///     .timeout(Duration::from_secs(30))
///     .max_retries(5)
///     .build()?;
/// ```
#[derive(Default)]
pub struct CloudantClientBuilder {
    base_url: Option<String>,
    authentication: Authentication,
    config: ClientConfigBuilder,
    transport: Option<BoxedService>,
    layers: Vec<LayerFn>,
    log_level: LogLevel,
}

impl std::fmt::Debug for CloudantClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudantClientBuilder")
            .field("base_url", &self.base_url)
            .field("authentication", &self.authentication)
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl CloudantClientBuilder {
    // ========================================================================
    // Target and Credentials
    // ========================================================================

    /// Set the service URL. A trailing slash is tolerated.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set how requests are authenticated.
    #[must_use]
    pub fn authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = authentication;
        self
    }

    /// Use a custom authenticator.
    #[must_use]
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authentication = Authentication::Custom(authenticator);
        self
    }

    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Replace every configuration setting at once.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        let mut builder = ClientConfig::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_per_host(config.pool_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .max_connections(config.max_connections)
            .max_retries(config.retry.max_retries)
            .backoff(config.retry.min_backoff, config.retry.max_backoff)
            .gzip_requests(config.gzip_requests);
        if let Some(deadline) = config.deadline {
            builder = builder.deadline(deadline);
        }
        if let Some(limit) = config.spool_limit {
            builder = builder.spool_limit(limit);
        }
        if let Some(suffix) = config.user_agent_suffix {
            builder = builder.user_agent_suffix(suffix);
        }
        self.config = builder;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the overall deadline of each call, retries included.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config = self.config.deadline(deadline);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set the maximum requests in flight at once.
    #[must_use]
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config = self.config.max_connections(count);
        self
    }

    /// Set the maximum number of retries after the first attempt.
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config = self.config.max_retries(retries);
        self
    }

    /// Set the retry backoff bounds.
    #[must_use]
    pub fn backoff(mut self, min: Duration, max: Duration) -> Self {
        self.config = self.config.backoff(min, max);
        self
    }

    /// Enable or disable gzip compression of JSON request bodies.
    #[must_use]
    pub fn gzip_requests(mut self, enabled: bool) -> Self {
        self.config = self.config.gzip_requests(enabled);
        self
    }

    /// Buffer streamed uploads of up to `limit` bytes so they can be retried.
    #[must_use]
    pub fn spool_limit(mut self, limit: usize) -> Self {
        self.config = self.config.spool_limit(limit);
        self
    }

    /// Append `suffix` to the default `User-Agent`.
    #[must_use]
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config = self.config.user_agent_suffix(suffix);
        self
    }

    // ========================================================================
    // Transport and Middleware
    // ========================================================================

    /// Send requests through `client` instead of the built-in hyper transport.
    #[must_use]
    pub fn http_client<C>(mut self, client: C) -> Self
    where
        C: HttpClient + 'static,
    {
        self.transport = Some(BoxCloneService::new(ClientService::new(client)));
        self
    }

    /// Log request and response headers at debug level.
    #[must_use]
    pub fn debug_logging(mut self) -> Self {
        self.log_level = LogLevel::Debug;
        self
    }

    /// Add a Tower layer around the transport.
    ///
    /// Layers are applied in order: first added = outermost. All of them sit
    /// inside the retry, logging, authentication and concurrency layers, so
    /// they see one attempt at a time with credentials attached.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response<Body>, Error = Error>
            + Clone
            + Send
            + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the client.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the base URL is missing or not
    ///   `http`/`https`, a credential is empty, or the `User-Agent` suffix is
    ///   not a valid header value
    /// - [`Error::InvalidUrl`] if the base URL cannot be parsed
    pub fn build(self) -> Result<CloudantClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::invalid_argument("base_url"))?;
        let base_url = Url::parse(&base_url)?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(Error::invalid_argument("base_url"));
        }

        let config = self.config.build();
        let transport = self
            .transport
            .unwrap_or_else(|| BoxCloneService::new(HyperTransport::new(&config)));

        let shutdown = CancellationToken::new();
        let authenticator = self.authentication.into_authenticator(
            &SyncService::new(transport.clone()),
            &base_url,
            &shutdown,
        )?;

        let mut service = transport;
        for layer in self.layers.iter().rev() {
            service = layer(service);
        }
        let service = ServiceBuilder::new()
            .layer(RetryLayer::new(RetryPolicy::new(config.retry)))
            .layer(match self.log_level {
                LogLevel::Debug => LoggingLayer::debug(),
                LogLevel::Info => LoggingLayer::new(),
            })
            .layer(AuthLayer::new(Arc::clone(&authenticator)))
            .layer(ConcurrencyLimitLayer::new(config.max_connections))
            .service(service);

        let request_options = RequestOptions {
            gzip: config.gzip_requests,
            user_agent: Some(user_agent(config.user_agent_suffix.as_deref())?),
            spool_limit: config.spool_limit,
        };

        debug!(base_url = %base_url, authenticator = ?authenticator, "client built");

        Ok(CloudantClient {
            inner: Arc::new(ClientInner {
                service: SyncService::new(BoxCloneService::new(service)),
                base_url,
                request_options,
                config,
                authenticator,
                shutdown,
            }),
            cancellation: None,
            deadline: None,
            headers: HeaderMap::new(),
        })
    }
}

/// `cloudant-rust/<version> (<os>; <arch>)`, plus an optional suffix.
fn user_agent(suffix: Option<&str>) -> Result<HeaderValue> {
    let mut agent = format!(
        "cloudant-rust/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    );
    if let Some(suffix) = suffix.filter(|suffix| !suffix.is_empty()) {
        agent.push(' ');
        agent.push_str(suffix);
    }
    HeaderValue::from_str(&agent).map_err(|_| Error::invalid_argument("user_agent_suffix"))
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn build_requires_base_url() {
        let_assert!(Err(Error::InvalidArgument(name)) = CloudantClient::builder().build());
        check!(name == "base_url");
    }

    #[test]
    fn build_rejects_other_schemes() {
        let result = CloudantClient::builder().base_url("ftp://example.com").build();
        let_assert!(Err(Error::InvalidArgument(name)) = result);
        check!(name == "base_url");
    }

    #[test]
    fn user_agent_carries_version_and_suffix() {
        let agent = user_agent(Some("my-app/2.0")).expect("user agent");
        let agent = agent.to_str().expect("ascii");

        check!(agent.starts_with(concat!("cloudant-rust/", env!("CARGO_PKG_VERSION"), " (")));
        check!(agent.ends_with(") my-app/2.0"));
    }

    #[test]
    fn user_agent_rejects_control_characters() {
        check!(user_agent(Some("bad\nsuffix")).is_err());
    }

    #[tokio::test]
    async fn close_is_shared_by_clones() {
        let client = CloudantClient::builder()
            .base_url("http://localhost:5984")
            .build()
            .expect("client");
        let clone = client.with_deadline(Duration::from_secs(1));

        client.close();

        check!(clone.is_closed());
    }
}
