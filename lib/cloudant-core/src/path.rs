//! Path templates and path segment encoding.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{Error, Result};

/// Characters left as-is in a path segment: the RFC 3986 unreserved set.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single path segment.
///
/// Everything outside the unreserved set is escaped, including `/`, so a
/// document ID such as `a/b` stays one segment on the wire.
///
/// # Example
///
/// ```
/// use cloudant_core::encode_segment;
///
/// assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
/// assert_eq!(encode_segment("caf\u{e9}"), "caf%C3%A9");
/// ```
#[must_use]
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// The original path template before parameter substitution.
///
/// This is stored in request extensions to allow middleware to access
/// the template pattern (e.g., `/{db}/{doc_id}`) rather than the resolved
/// path (e.g., `/animals/zebra`).
///
/// # Example
///
/// ```ignore
/// // In middleware
/// if let Some(template) = request.extensions().get::<PathTemplate>() {
///     tracing::debug!(template = %template, "dispatching");
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathTemplate(&'static str);

impl PathTemplate {
    /// Create a new path template. Placeholders are written `{name}`.
    #[must_use]
    pub const fn new(template: &'static str) -> Self {
        Self(template)
    }

    /// Get the template string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Substitute every `{name}` placeholder with its encoded value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] naming the parameter when a
    /// placeholder has no value, the value is empty, or the value is a dot
    /// segment (`.` or `..`).
    pub fn resolve<S: AsRef<str>>(&self, params: &[(&'static str, S)]) -> Result<String> {
        let mut resolved = String::with_capacity(self.0.len() + 32);
        let mut rest = self.0;

        while let Some((before, after)) = rest.split_once('{') {
            resolved.push_str(before);
            let (name, tail) = after.split_once('}').ok_or_else(|| {
                Error::invalid_argument(format!("malformed path template `{}`", self.0))
            })?;

            let value = params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_ref())
                .ok_or_else(|| Error::invalid_argument(name))?;
            validate_segment(name, value)?;
            resolved.push_str(&encode_segment(value));

            rest = tail;
        }
        resolved.push_str(rest);

        Ok(resolved)
    }
}

/// Reject values that cannot be sent as a single path segment.
pub(crate) fn validate_segment(name: &str, value: &str) -> Result<()> {
    match value {
        "" => Err(Error::invalid_argument(name)),
        "." | ".." => Err(Error::invalid_argument(format!(
            "{name}: `{value}` is not a valid path segment"
        ))),
        _ => Ok(()),
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PathTemplate {
    fn as_ref(&self) -> &str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use percent_encoding::percent_decode_str;

    use super::*;

    #[test]
    fn path_template_as_str() {
        let template = PathTemplate::new("/{db}/_design/{ddoc}");
        assert_eq!(template.as_str(), "/{db}/_design/{ddoc}");
        assert_eq!(template.to_string(), "/{db}/_design/{ddoc}");
    }

    #[test]
    fn encode_segment_escapes_reserved() {
        check!(encode_segment("plain-id_1.~") == "plain-id_1.~");
        check!(encode_segment("a/b") == "a%2Fb");
        check!(encode_segment("a b") == "a%20b");
        check!(encode_segment("a+b?c#d") == "a%2Bb%3Fc%23d");
        check!(encode_segment("\u{1F600}") == "%F0%9F%98%80");
    }

    #[test]
    fn encoded_segments_decode_to_the_original() {
        let inputs = [
            "_design/app",
            "100%",
            "%2F",
            "a+b",
            "a b\tc\nd\r",
            "\u{0}\u{1f}\u{7f}",
            "?#[]@!$&'()*,;=:",
            "...",
            "\"quoted\"\\",
            "caf\u{e9} \u{4e2d}\u{6587}",
            "\u{1F600}\u{10FFFF}",
        ];

        for input in inputs {
            let encoded = encode_segment(input);
            check!(
                encoded
                    .bytes()
                    .all(|byte| byte.is_ascii_alphanumeric() || b"-._~%".contains(&byte)),
                "{input:?} encoded as {encoded:?}"
            );
            let_assert!(Ok(decoded) = percent_decode_str(&encoded).decode_utf8());
            check!(decoded == input);

            let url = url::Url::parse(&format!("https://example.com/db/{encoded}")).expect("url");
            let_assert!(Some(mut segments) = url.path_segments());
            check!(segments.nth(1) == Some(encoded.as_str()));
        }
    }

    #[test]
    fn resolve_substitutes_params() {
        let template = PathTemplate::new("/{db}/_design/{ddoc}/_view/{view}");
        let resolved = template
            .resolve(&[("db", "my db"), ("ddoc", "app"), ("view", "by/name")])
            .expect("resolve");

        assert_eq!(resolved, "/my%20db/_design/app/_view/by%2Fname");
    }

    #[test]
    fn resolve_without_placeholders() {
        let template = PathTemplate::new("/_all_dbs");
        let resolved = template.resolve::<&str>(&[]).expect("resolve");
        assert_eq!(resolved, "/_all_dbs");
    }

    #[test]
    fn resolve_rejects_empty_value() {
        let template = PathTemplate::new("/{db}");
        let result = template.resolve(&[("db", "")]);

        let_assert!(Err(Error::InvalidArgument(name)) = result);
        check!(name == "db");
    }

    #[test]
    fn resolve_rejects_missing_value() {
        let template = PathTemplate::new("/{db}/{doc_id}");
        let result = template.resolve(&[("db", "animals")]);

        let_assert!(Err(Error::InvalidArgument(name)) = result);
        check!(name == "doc_id");
    }

    #[test]
    fn resolve_rejects_dot_segments() {
        let template = PathTemplate::new("/{db}/{doc_id}");

        check!(template.resolve(&[("db", "animals"), ("doc_id", ".")]).is_err());
        check!(template.resolve(&[("db", ".."), ("doc_id", "a")]).is_err());
        check!(template.resolve(&[("db", "animals"), ("doc_id", "...")]).is_ok());
    }
}
