//! Shared credential cache with serialized refresh.
//!
//! Callers that find the cached credential missing or close to expiry join a
//! single in-flight refresh instead of starting their own. The refresh is a
//! shared future that stores its result in the cache when it completes, so
//! the lock is only ever held for the few instructions that read or replace
//! the state.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use http::HeaderValue;
use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Credentials are refreshed this long before they expire.
pub const REFRESH_WINDOW: Duration = Duration::from_secs(60);

/// A credential header value and its expiry.
#[derive(Debug, Clone)]
pub struct Token {
    /// Value sent in the credential header.
    pub value: HeaderValue,
    /// When the server stops accepting it; `None` until rejected.
    pub expires_at: Option<Instant>,
}

impl Token {
    fn is_fresh(&self, window: Duration) -> bool {
        self.expires_at
            .is_none_or(|expires_at| Instant::now() + window < expires_at)
    }
}

type Refresh = Shared<BoxFuture<'static, std::result::Result<Token, Arc<Error>>>>;

#[derive(Default)]
struct CacheState {
    token: Option<Token>,
    inflight: Option<Refresh>,
}

/// Credential cache shared by every request of one client.
#[derive(Clone)]
pub struct TokenCache {
    state: Arc<Mutex<CacheState>>,
    shutdown: CancellationToken,
    window: Duration,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TokenCache")
            .field("cached", &state.token.is_some())
            .field("refreshing", &state.inflight.is_some())
            .field("window", &self.window)
            .finish()
    }
}

impl TokenCache {
    /// Create an empty cache that stops refreshing once `shutdown` fires.
    #[must_use]
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            state: Arc::default(),
            shutdown,
            window: REFRESH_WINDOW,
        }
    }

    /// Return the cached credential, refreshing it with `fetch` when missing
    /// or within the refresh window of its expiry.
    ///
    /// `fetch` runs at most once across all concurrent callers.
    ///
    /// # Errors
    ///
    /// - [`Error::Auth`] if the refresh failed; every waiter sees the failure
    /// - [`Error::Cancelled`] if the client was closed while waiting
    pub async fn get<F, Fut>(&self, fetch: F) -> Result<HeaderValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Token>> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let refresh = {
            let mut state = self.state.lock();
            if let Some(token) = &state.token
                && token.is_fresh(self.window)
            {
                return Ok(token.value.clone());
            }
            match &state.inflight {
                Some(inflight) => inflight.clone(),
                None => {
                    debug!("refreshing credential");
                    let refresh = Self::refresh(Arc::downgrade(&self.state), fetch());
                    state.inflight = Some(refresh.clone());
                    refresh
                }
            }
        };

        tokio::select! {
            biased;
            () = self.shutdown.cancelled() => {
                self.state.lock().inflight = None;
                Err(Error::Cancelled)
            }
            result = refresh => match result {
                Ok(token) => Ok(token.value),
                Err(error) => Err(match error.root() {
                    Error::Auth { status, message } => Error::auth(*status, message.clone()),
                    Error::Cancelled => Error::Cancelled,
                    other => Error::auth(other.status(), other.to_string()),
                }),
            },
        }
    }

    fn refresh<Fut>(state: Weak<Mutex<CacheState>>, fetch: Fut) -> Refresh
    where
        Fut: Future<Output = Result<Token>> + Send + 'static,
    {
        async move {
            let result = fetch.await;
            if let Some(state) = state.upgrade() {
                let mut state = state.lock();
                state.inflight = None;
                match &result {
                    Ok(token) => state.token = Some(token.clone()),
                    Err(error) => warn!(%error, "credential refresh failed"),
                }
            }
            result.map_err(Arc::new)
        }
        .boxed()
        .shared()
    }

    /// Drop the cached credential if it is still the one the server rejected.
    ///
    /// A credential already replaced by a concurrent refresh is kept.
    pub fn invalidate(&self, rejected: &HeaderValue) {
        let mut state = self.state.lock();
        if state
            .token
            .as_ref()
            .is_some_and(|token| token.value == *rejected)
        {
            debug!("cached credential rejected, dropping it");
            state.token = None;
        }
    }
}

/// Run a credential acquisition, repeating it once after a transport failure
/// or timeout.
///
/// # Errors
///
/// Returns the second failure, or the first one if it is not transient.
pub async fn acquire_with_retry<F, Fut>(mut acquire: F) -> Result<Token>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Token>>,
{
    match acquire().await {
        Err(error) if error.is_connection() || error.is_timeout() => {
            warn!(%error, "credential request failed, trying once more");
            acquire().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert2::{check, let_assert};

    use super::*;

    fn token(value: &'static str, ttl: Option<Duration>) -> Token {
        Token {
            value: HeaderValue::from_static(value),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    #[tokio::test]
    async fn caches_until_refresh_window() {
        let cache = TokenCache::new(CancellationToken::new());
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .get(move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(token("Bearer a", Some(Duration::from_secs(3600))))
                })
                .await
                .expect("token");
            check!(value == "Bearer a");
        }
        check!(calls.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    async fn refreshes_inside_window() {
        let cache = TokenCache::new(CancellationToken::new());
        let first = cache
            .get(|| async { Ok(token("Bearer old", Some(Duration::from_secs(30)))) })
            .await
            .expect("token");
        check!(first == "Bearer old");

        let second = cache
            .get(|| async { Ok(token("Bearer new", Some(Duration::from_secs(3600)))) })
            .await
            .expect("token");
        check!(second == "Bearer new");
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let cache = TokenCache::new(CancellationToken::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let waiters = (0..8).map(|_| {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .get(move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(token("Bearer shared", None))
                    })
                    .await
            })
        });
        for waiter in futures_util::future::join_all(waiters).await {
            let_assert!(Ok(Ok(value)) = waiter);
            check!(value == "Bearer shared");
        }
        check!(calls.load(Ordering::SeqCst) == 1);
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_as_auth_error() {
        let cache = TokenCache::new(CancellationToken::new());
        let result = cache
            .get(|| async { Err(Error::http(400, "bad api key")) })
            .await;

        let_assert!(Err(error) = result);
        check!(error.kind() == crate::ErrorKind::AuthError);
        check!(error.status() == Some(400));
    }

    #[tokio::test]
    async fn invalidate_only_drops_the_rejected_value() {
        let cache = TokenCache::new(CancellationToken::new());
        cache
            .get(|| async { Ok(token("AuthSession=a", None)) })
            .await
            .expect("token");

        cache.invalidate(&HeaderValue::from_static("AuthSession=stale"));
        let kept = cache
            .get(|| async { Ok(token("AuthSession=b", None)) })
            .await
            .expect("token");
        check!(kept == "AuthSession=a");

        cache.invalidate(&HeaderValue::from_static("AuthSession=a"));
        let fresh = cache
            .get(|| async { Ok(token("AuthSession=b", None)) })
            .await
            .expect("token");
        check!(fresh == "AuthSession=b");
    }

    #[tokio::test]
    async fn shutdown_cancels_waiting_callers() {
        let shutdown = CancellationToken::new();
        let cache = TokenCache::new(shutdown.clone());

        let waiter = tokio::spawn({
            let cache = cache.clone();
            async move {
                cache
                    .get(|| async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok(token("Bearer late", None))
                    })
                    .await
            }
        });
        tokio::task::yield_now().await;
        shutdown.cancel();

        let_assert!(Ok(Err(Error::Cancelled)) = waiter.await);
    }

    #[tokio::test]
    async fn acquisition_is_retried_once_on_transport_error() {
        let calls = AtomicUsize::new(0);
        let result = acquire_with_retry(|| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(Error::connection("reset"))
                } else {
                    Ok(token("Bearer b", None))
                }
            }
        })
        .await;

        check!(result.is_ok());
        check!(calls.load(Ordering::SeqCst) == 2);
    }

    #[tokio::test]
    async fn acquisition_gives_up_after_second_failure() {
        let calls = AtomicUsize::new(0);
        let result = acquire_with_retry(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Timeout) }
        })
        .await;

        check!(result.is_err());
        check!(calls.load(Ordering::SeqCst) == 2);
    }
}
