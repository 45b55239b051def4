//! Request methods used by the Cloudant API.

use std::fmt;

/// HTTP request method.
///
/// Cloudant never uses `PATCH` or `OPTIONS`, so only these five exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Responses to `HEAD` never carry a body.
    #[must_use]
    pub const fn is_head(&self) -> bool {
        matches!(self, Self::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Head => Self::HEAD,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_http() {
        for method in [Method::Get, Method::Head, Method::Post, Method::Put, Method::Delete] {
            assert_eq!(method.to_string(), http::Method::from(method).as_str());
        }
    }

    #[test]
    fn only_head_is_head() {
        assert!(Method::Head.is_head());
        assert!(!Method::Get.is_head());
    }
}
