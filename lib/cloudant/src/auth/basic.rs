//! Basic authentication.
//!
//! Adds an `Authorization: Basic <base64(user:pass)>` header to every request.

use base64::Engine;
use futures_util::future::BoxFuture;
use http::HeaderValue;
use http::header::AUTHORIZATION;

use super::Authenticator;
use crate::{Error, Request, Result};

/// Authenticator for HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuthenticator {
    /// `Basic ` followed by base64-encoded "username:password".
    header: HeaderValue,
}

impl BasicAuthenticator {
    /// Create a basic authenticator for the given username and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the username is empty.
    pub fn new(username: &str, password: &str) -> Result<Self> {
        if username.is_empty() {
            return Err(Error::invalid_argument("username"));
        }
        let credentials = format!("{username}:{password}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        let mut header = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|_| Error::invalid_argument("username"))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl std::fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthenticator").finish_non_exhaustive()
    }
}

impl Authenticator for BasicAuthenticator {
    fn authenticate<'a>(&'a self, request: &'a mut Request) -> BoxFuture<'a, Result<()>> {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.header.clone());
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use url::Url;

    use super::*;
    use crate::Method;

    #[tokio::test]
    async fn adds_basic_header() {
        let auth = BasicAuthenticator::new("admin", "pass").expect("authenticator");
        let mut request =
            Request::builder(Method::Get, Url::parse("http://localhost/").expect("url")).build();

        auth.authenticate(&mut request).await.expect("authenticate");

        // base64("admin:pass")
        check!(request.header("authorization") == Some("Basic YWRtaW46cGFzcw=="));
    }

    #[test]
    fn rejects_empty_username() {
        let_assert!(Err(Error::InvalidArgument(name)) = BasicAuthenticator::new("", "pass"));
        check!(name == "username");
    }
}
