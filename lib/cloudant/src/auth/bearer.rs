//! Bearer token authentication with a fixed token.

use futures_util::future::BoxFuture;
use http::HeaderValue;
use http::header::AUTHORIZATION;

use super::Authenticator;
use crate::{Error, Request, Result};

/// Authenticator adding `Authorization: Bearer <token>` to every request.
#[derive(Clone)]
pub struct BearerAuthenticator {
    header: HeaderValue,
}

impl BearerAuthenticator {
    /// Create a bearer authenticator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the token is empty or cannot be
    /// sent in a header.
    pub fn new(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::invalid_argument("token"));
        }
        let mut header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::invalid_argument("token"))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl std::fmt::Debug for BearerAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthenticator").finish_non_exhaustive()
    }
}

impl Authenticator for BearerAuthenticator {
    fn authenticate<'a>(&'a self, request: &'a mut Request) -> BoxFuture<'a, Result<()>> {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.header.clone());
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use url::Url;

    use super::*;
    use crate::Method;

    #[tokio::test]
    async fn adds_bearer_header() {
        let auth = BearerAuthenticator::new("my-token").expect("authenticator");
        let mut request =
            Request::builder(Method::Get, Url::parse("http://localhost/").expect("url")).build();

        auth.authenticate(&mut request).await.expect("authenticate");

        check!(request.header("authorization") == Some("Bearer my-token"));
    }

    #[test]
    fn rejects_header_breaking_token() {
        check!(BearerAuthenticator::new("bad\ntoken").is_err());
        check!(BearerAuthenticator::new("").is_err());
    }
}
