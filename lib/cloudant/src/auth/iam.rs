//! IAM token authentication.
//!
//! An API key is exchanged at the IAM token endpoint for a short-lived bearer
//! token, which is cached and refreshed shortly before it expires.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::BoxFuture;
use http::HeaderMap;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use url::Url;

use super::token_cache::{Token, TokenCache, acquire_with_retry};
use super::Authenticator;
use crate::transport::SyncService;
use crate::{ContentType, Error, Method, Request, Result, to_form};

/// Default IAM token endpoint.
pub const DEFAULT_IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

const API_KEY_GRANT: &str = "urn:ibm:params:oauth:grant-type:apikey";

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    apikey: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expiration: Option<u64>,
}

impl TokenResponse {
    /// Remaining lifetime: `expires_in` when given, else `expiration` (epoch
    /// seconds) relative to now.
    fn lifetime(&self) -> Option<Duration> {
        if let Some(seconds) = self.expires_in {
            return Some(Duration::from_secs(seconds));
        }
        let expiration = UNIX_EPOCH + Duration::from_secs(self.expiration?);
        Some(
            expiration
                .duration_since(SystemTime::now())
                .unwrap_or_default(),
        )
    }
}

/// Authenticator exchanging an IAM API key for bearer tokens.
#[derive(Clone)]
pub struct IamAuthenticator {
    transport: SyncService,
    token_url: Url,
    api_key: String,
    cache: TokenCache,
}

impl IamAuthenticator {
    pub(crate) fn new(
        transport: SyncService,
        token_url: Url,
        api_key: String,
        cache: TokenCache,
    ) -> Self {
        Self {
            transport,
            token_url,
            api_key,
            cache,
        }
    }

    async fn request_token(
        transport: SyncService,
        token_url: Url,
        api_key: String,
    ) -> Result<Token> {
        let body = to_form(&TokenRequest {
            grant_type: API_KEY_GRANT,
            apikey: &api_key,
        })?;
        let request = Request::builder(Method::Post, token_url)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static(ContentType::FormUrlEncoded.as_str()),
            )
            .header(ACCEPT, HeaderValue::from_static(ContentType::Json.as_str()))
            .body(body)
            .build();

        let response = transport.call(request).await?.collect().await?;
        if !response.is_success() {
            let error = Error::from_response(response.status(), response.into_body());
            return Err(Error::auth(
                error.status(),
                format!("IAM token request failed: {error}"),
            ));
        }

        let token: TokenResponse = response
            .json()
            .map_err(|e| Error::auth(None, format!("IAM token response unreadable: {e}")))?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
            .map_err(|_| Error::auth(None, "IAM token is not a valid header value"))?;
        value.set_sensitive(true);

        Ok(Token {
            value,
            expires_at: token.lifetime().map(|lifetime| Instant::now() + lifetime),
        })
    }
}

impl std::fmt::Debug for IamAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamAuthenticator")
            .field("token_url", &self.token_url.as_str())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Authenticator for IamAuthenticator {
    fn authenticate<'a>(&'a self, request: &'a mut Request) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let transport = self.transport.clone();
            let token_url = self.token_url.clone();
            let api_key = self.api_key.clone();
            let value = self
                .cache
                .get(move || async move {
                    acquire_with_retry(|| {
                        Self::request_token(transport.clone(), token_url.clone(), api_key.clone())
                    })
                    .await
                })
                .await?;
            request.headers_mut().insert(AUTHORIZATION, value);
            Ok(())
        })
    }

    fn refreshes_on_unauthorized(&self) -> bool {
        true
    }

    fn invalidate(&self, rejected: &HeaderMap) {
        if let Some(value) = rejected.get(AUTHORIZATION) {
            self.cache.invalidate(value);
        }
    }
}
