//! Cookie session authentication.
//!
//! Credentials are posted once to `{base}/_session`; the `AuthSession` cookie
//! the server returns is attached to every request until it nears its expiry
//! or the server rejects it.

use std::time::{Duration, SystemTime};

use futures_util::future::BoxFuture;
use http::HeaderMap;
use http::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderValue, SET_COOKIE};
use serde::Serialize;
use tokio::time::Instant;
use url::Url;

use super::token_cache::{Token, TokenCache, acquire_with_retry};
use super::Authenticator;
use crate::transport::SyncService;
use crate::{ContentType, Error, Method, Request, Result, to_json};

const COOKIE_NAME: &str = "AuthSession";

#[derive(Serialize)]
struct Login<'a> {
    name: &'a str,
    password: &'a str,
}

/// A parsed `AuthSession` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionCookie {
    value: String,
    lifetime: Option<Duration>,
}

/// Authenticator holding a server session cookie.
#[derive(Clone)]
pub struct SessionAuthenticator {
    transport: SyncService,
    session_url: Url,
    username: String,
    password: String,
    cache: TokenCache,
}

impl SessionAuthenticator {
    pub(crate) fn new(
        transport: SyncService,
        base_url: &Url,
        username: String,
        password: String,
        cache: TokenCache,
    ) -> Result<Self> {
        if username.is_empty() {
            return Err(Error::invalid_argument("username"));
        }
        let mut session_url = base_url.clone();
        let path = format!("{}/_session", base_url.path().trim_end_matches('/'));
        session_url.set_path(&path);
        session_url.set_query(None);
        Ok(Self {
            transport,
            session_url,
            username,
            password,
            cache,
        })
    }

    async fn login(
        transport: SyncService,
        session_url: Url,
        username: String,
        password: String,
    ) -> Result<Token> {
        let body = to_json(&Login {
            name: &username,
            password: &password,
        })?;
        let request = Request::builder(Method::Post, session_url)
            .header(CONTENT_TYPE, HeaderValue::from_static(ContentType::Json.as_str()))
            .header(ACCEPT, HeaderValue::from_static(ContentType::Json.as_str()))
            .body(body)
            .build();

        let response = transport.call(request).await?.collect().await?;
        if !response.is_success() {
            let error = Error::from_response(response.status(), response.into_body());
            return Err(Error::auth(
                error.status(),
                format!("session login failed: {error}"),
            ));
        }

        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(parse_session_cookie)
            .ok_or_else(|| Error::auth(None, "session login returned no AuthSession cookie"))?;

        let mut value = HeaderValue::from_str(&format!("{COOKIE_NAME}={}", cookie.value))
            .map_err(|_| Error::auth(None, "session cookie is not a valid header value"))?;
        value.set_sensitive(true);

        Ok(Token {
            value,
            expires_at: cookie.lifetime.map(|lifetime| Instant::now() + lifetime),
        })
    }
}

/// Parse a `Set-Cookie` value, keeping it only if it is the session cookie.
///
/// `Max-Age` takes precedence over `Expires`.
fn parse_session_cookie(set_cookie: &str) -> Option<SessionCookie> {
    let mut attributes = set_cookie.split(';').map(str::trim);
    let (name, value) = attributes.next()?.split_once('=')?;
    if name != COOKIE_NAME || value.is_empty() {
        return None;
    }

    let mut max_age = None;
    let mut expires = None;
    for attribute in attributes {
        let Some((key, val)) = attribute.split_once('=') else {
            continue;
        };
        if key.eq_ignore_ascii_case("max-age") {
            max_age = val.trim().parse::<u64>().ok().map(Duration::from_secs);
        } else if key.eq_ignore_ascii_case("expires") {
            expires = httpdate::parse_http_date(val.trim())
                .ok()
                .map(|at| at.duration_since(SystemTime::now()).unwrap_or_default());
        }
    }

    Some(SessionCookie {
        value: value.to_string(),
        lifetime: max_age.or(expires),
    })
}

impl std::fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthenticator")
            .field("session_url", &self.session_url.as_str())
            .field("username", &self.username)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Authenticator for SessionAuthenticator {
    fn authenticate<'a>(&'a self, request: &'a mut Request) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let transport = self.transport.clone();
            let session_url = self.session_url.clone();
            let username = self.username.clone();
            let password = self.password.clone();
            let value = self
                .cache
                .get(move || async move {
                    acquire_with_retry(|| {
                        Self::login(
                            transport.clone(),
                            session_url.clone(),
                            username.clone(),
                            password.clone(),
                        )
                    })
                    .await
                })
                .await?;
            request.headers_mut().insert(COOKIE, value);
            Ok(())
        })
    }

    fn refreshes_on_unauthorized(&self) -> bool {
        true
    }

    fn invalidate(&self, rejected: &HeaderMap) {
        if let Some(value) = rejected.get(COOKIE) {
            self.cache.invalidate(value);
        }
    }
}
