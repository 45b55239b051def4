//! Client configuration types.

use std::time::Duration;

use crate::middleware::RetryConfig;

/// Configuration for the Cloudant client.
///
/// The connection target and credentials live on
/// [`CloudantClientBuilder`](crate::CloudantClientBuilder); this struct holds
/// everything else and is shared, immutable, by every call once the client is
/// built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-attempt timeout, from dispatch until response headers arrive.
    pub timeout: Duration,
    /// Overall deadline for one call, spanning every retry attempt.
    pub deadline: Option<Duration>,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum requests in flight at once.
    pub max_connections: usize,
    /// Retry budget and backoff bounds.
    pub retry: RetryConfig,
    /// Gzip-compress JSON request bodies.
    pub gzip_requests: bool,
    /// Largest streamed upload buffered in memory so it can be retried.
    ///
    /// With no limit, streamed uploads are sent as they are produced and are
    /// never retried.
    pub spool_limit: Option<usize>,
    /// Appended to the default `User-Agent`.
    pub user_agent_suffix: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(150),
            deadline: None,
            connect_timeout: Duration::from_secs(30),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            max_connections: 64,
            retry: RetryConfig::default(),
            gzip_requests: true,
            spool_limit: None,
            user_agent_suffix: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    timeout: Option<Duration>,
    deadline: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    max_connections: Option<usize>,
    max_retries: Option<u32>,
    min_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
    gzip_requests: Option<bool>,
    spool_limit: Option<usize>,
    user_agent_suffix: Option<String>,
}

impl ClientConfigBuilder {
    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the overall call deadline.
    #[must_use]
    pub const fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the maximum requests in flight at once.
    #[must_use]
    pub const fn max_connections(mut self, count: usize) -> Self {
        self.max_connections = Some(count);
        self
    }

    /// Set the maximum number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Set the backoff bounds.
    #[must_use]
    pub const fn backoff(mut self, min: Duration, max: Duration) -> Self {
        self.min_backoff = Some(min);
        self.max_backoff = Some(max);
        self
    }

    /// Enable or disable gzip compression of JSON request bodies.
    #[must_use]
    pub const fn gzip_requests(mut self, enabled: bool) -> Self {
        self.gzip_requests = Some(enabled);
        self
    }

    /// Buffer streamed uploads of up to `limit` bytes so they can be retried.
    #[must_use]
    pub const fn spool_limit(mut self, limit: usize) -> Self {
        self.spool_limit = Some(limit);
        self
    }

    /// Append `suffix` to the default `User-Agent`.
    #[must_use]
    pub fn user_agent_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.user_agent_suffix = Some(suffix.into());
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        let defaults = ClientConfig::default();
        let min_backoff = self.min_backoff.unwrap_or(defaults.retry.min_backoff);
        let max_backoff = self
            .max_backoff
            .unwrap_or(defaults.retry.max_backoff)
            .max(min_backoff);
        ClientConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            deadline: self.deadline.or(defaults.deadline),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            max_connections: self
                .max_connections
                .unwrap_or(defaults.max_connections)
                .max(1),
            retry: RetryConfig {
                max_retries: self.max_retries.unwrap_or(defaults.retry.max_retries),
                min_backoff,
                max_backoff,
            },
            gzip_requests: self.gzip_requests.unwrap_or(defaults.gzip_requests),
            spool_limit: self.spool_limit.or(defaults.spool_limit),
            user_agent_suffix: self.user_agent_suffix.or(defaults.user_agent_suffix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(150));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.pool_idle_per_host, 32);
        assert!(config.gzip_requests);
        assert!(config.deadline.is_none());
        assert!(config.spool_limit.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_per_host(16)
            .max_retries(5)
            .backoff(Duration::from_millis(10), Duration::from_millis(200))
            .gzip_requests(false)
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.pool_idle_per_host, 16);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.min_backoff, Duration::from_millis(10));
        assert_eq!(config.retry.max_backoff, Duration::from_millis(200));
        assert!(!config.gzip_requests);
    }

    #[test]
    fn max_backoff_never_below_min() {
        let config = ClientConfig::builder()
            .backoff(Duration::from_secs(2), Duration::from_secs(1))
            .build();

        assert_eq!(config.retry.max_backoff, Duration::from_secs(2));
    }
}
