//! Authenticators.
//!
//! An [`Authenticator`] attaches credentials to each outgoing request. The
//! client picks one from its [`Authentication`] setting:
//!
//! | Variant | Header | Refresh |
//! |---------|--------|---------|
//! | `None` | none | never |
//! | `Basic` | `Authorization: Basic ...` | never |
//! | `Bearer` | `Authorization: Bearer ...` | never |
//! | `Iam` | `Authorization: Bearer ...` | before expiry, and on 401 |
//! | `Session` | `Cookie: AuthSession=...` | before expiry, and on 401 |
//!
//! Token-based authenticators fetch their credential over the bare transport,
//! outside the retry chain, so a failed login is retried at most once.

mod basic;
mod bearer;
mod iam;
mod session;
mod token_cache;

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use http::HeaderMap;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use basic::BasicAuthenticator;
pub use bearer::BearerAuthenticator;
pub use iam::{DEFAULT_IAM_TOKEN_URL, IamAuthenticator};
pub use session::SessionAuthenticator;
pub use token_cache::{REFRESH_WINDOW, Token, TokenCache};

use crate::transport::SyncService;
use crate::{Request, Result};

/// Attaches credentials to outgoing requests.
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Add credentials to `request`, acquiring or refreshing them first when
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if credentials could not be acquired.
    fn authenticate<'a>(&'a self, request: &'a mut Request) -> BoxFuture<'a, Result<()>>;

    /// Whether a 401 response may mean the cached credential went stale, in
    /// which case the request is sent once more with a fresh credential.
    fn refreshes_on_unauthorized(&self) -> bool {
        false
    }

    /// Forget the credential carried by `rejected`, the headers of a request
    /// the server answered with 401.
    fn invalidate(&self, _rejected: &HeaderMap) {}
}

/// Authenticator that adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuthenticator;

impl Authenticator for NoAuthenticator {
    fn authenticate<'a>(&'a self, _request: &'a mut Request) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// How the client authenticates.
#[derive(Clone, Default)]
pub enum Authentication {
    /// Send no credentials.
    #[default]
    None,
    /// HTTP basic authentication.
    Basic {
        /// Account name.
        username: String,
        /// Password.
        password: String,
    },
    /// A fixed bearer token.
    Bearer {
        /// Token value.
        token: String,
    },
    /// Cookie session obtained from the server's `_session` endpoint.
    Session {
        /// Account name.
        username: String,
        /// Password.
        password: String,
    },
    /// Bearer tokens exchanged for an IAM API key.
    Iam {
        /// API key.
        api_key: String,
        /// Token endpoint; defaults to [`DEFAULT_IAM_TOKEN_URL`].
        token_url: Option<Url>,
    },
    /// A caller-provided authenticator.
    Custom(Arc<dyn Authenticator>),
}

impl Authentication {
    /// HTTP basic authentication.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// A fixed bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Cookie session authentication.
    pub fn session(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Session {
            username: username.into(),
            password: password.into(),
        }
    }

    /// IAM authentication against the default token endpoint.
    pub fn iam(api_key: impl Into<String>) -> Self {
        Self::Iam {
            api_key: api_key.into(),
            token_url: None,
        }
    }

    /// Build the authenticator for a client talking to `base_url`.
    pub(crate) fn into_authenticator(
        self,
        transport: &SyncService,
        base_url: &Url,
        shutdown: &CancellationToken,
    ) -> Result<Arc<dyn Authenticator>> {
        Ok(match self {
            Self::None => Arc::new(NoAuthenticator),
            Self::Basic { username, password } => {
                Arc::new(BasicAuthenticator::new(&username, &password)?)
            }
            Self::Bearer { token } => Arc::new(BearerAuthenticator::new(&token)?),
            Self::Session { username, password } => Arc::new(SessionAuthenticator::new(
                transport.clone(),
                base_url,
                username,
                password,
                TokenCache::new(shutdown.clone()),
            )?),
            Self::Iam { api_key, token_url } => {
                let token_url = match token_url {
                    Some(url) => url,
                    None => Url::parse(DEFAULT_IAM_TOKEN_URL)?,
                };
                Arc::new(IamAuthenticator::new(
                    transport.clone(),
                    token_url,
                    api_key,
                    TokenCache::new(shutdown.clone()),
                ))
            }
            Self::Custom(authenticator) => authenticator,
        })
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[redacted]")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[redacted]")
                .finish(),
            Self::Session { username, .. } => f
                .debug_struct("Session")
                .field("username", username)
                .field("password", &"[redacted]")
                .finish(),
            Self::Iam { token_url, .. } => f
                .debug_struct("Iam")
                .field("api_key", &"[redacted]")
                .field("token_url", token_url)
                .finish(),
            Self::Custom(authenticator) => f.debug_tuple("Custom").field(authenticator).finish(),
        }
    }
}
