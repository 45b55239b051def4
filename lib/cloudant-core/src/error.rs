//! Error types for the Cloudant client.

use bytes::Bytes;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification of an [`Error`].
///
/// Every error produced by the client maps onto exactly one kind, which is the
/// stable thing to match on when deciding how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// A required input was missing, or an input value was rejected before dispatch.
    #[display("invalid argument")]
    InvalidArgument,
    /// A value could not be encoded for the wire.
    #[display("encode error")]
    EncodeError,
    /// The connection failed, was reset, or TLS negotiation failed.
    #[display("transport error")]
    TransportError,
    /// A per-attempt timeout or the overall deadline expired.
    #[display("timeout")]
    Timeout,
    /// Credentials could not be acquired, or were rejected after a refresh.
    #[display("authentication error")]
    AuthError,
    /// The server answered 429 and the retry budget was exhausted.
    #[display("rate limited")]
    RateLimited,
    /// The server answered with a 4xx status other than 401 or 429.
    #[display("client error")]
    ClientError,
    /// The server answered with a 5xx status and the retry budget was exhausted.
    #[display("server error")]
    ServerError,
    /// A 2xx response body did not match the expected model.
    #[display("decode error")]
    DecodeError,
    /// The caller cancelled the call, or the client was closed.
    #[display("cancelled")]
    Cancelled,
}

// ============================================================================
// Server Error Body
// ============================================================================

/// Error document returned by the server alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerErrorBody {
    /// Short error code, for example `not_found` or `conflict`.
    pub error: String,
    /// Human readable explanation.
    #[serde(default)]
    pub reason: String,
    /// Nested cause reported by some endpoints.
    #[serde(default, rename = "caused_by", skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<serde_json::Value>,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for Cloudant operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// A required input was missing or empty, or a path segment was rejected.
    #[display("invalid argument: {_0}")]
    #[from(skip)]
    InvalidArgument(#[error(not(source))] String),

    /// A value could not be encoded, for example an unknown enum value.
    #[display("encode error: {_0}")]
    #[from(skip)]
    Encode(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// Query string serialization error.
    #[display("query serialization error: {_0}")]
    #[from]
    QuerySerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Credential acquisition failed, or the server rejected a refreshed credential.
    #[display("authentication failed: {message}")]
    #[from(skip)]
    Auth {
        /// HTTP status of the failed token or session exchange, if any.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Decoded server error document, when the body carried one.
        server: Option<ServerErrorBody>,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// JSON deserialization error with location context.
    #[display("JSON deserialization error at '{pointer}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON pointer to the offending value (e.g. `/rows/3/doc/_rev`).
        pointer: String,
        /// Error message.
        message: String,
        /// The body that failed to decode.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// A response body could not be decoded, for example a corrupt gzip stream.
    #[display("decode error: {_0}")]
    #[from(skip)]
    Decode(#[error(not(source))] String),

    /// The call was cancelled or the client was closed.
    #[display("operation cancelled")]
    #[from(skip)]
    Cancelled,

    /// An error raised while executing a named operation.
    #[display("{operation} failed: {source}")]
    #[from(skip)]
    Operation {
        /// Operation name, for example `getDocument`.
        operation: &'static str,
        /// Underlying error.
        source: Box<Error>,
    },
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid argument error naming the offending input.
    #[must_use]
    pub fn invalid_argument(name: impl Into<String>) -> Self {
        Self::InvalidArgument(name.into())
    }

    /// Create an encode error.
    #[must_use]
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an authentication error.
    #[must_use]
    pub fn auth(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Auth {
            status,
            message: message.into(),
        }
    }

    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            server: None,
            body: None,
        }
    }

    /// Create an HTTP error from a buffered error response body.
    ///
    /// The body is decoded as a [`ServerErrorBody`] on a best-effort basis; the
    /// raw bytes are kept either way.
    #[must_use]
    pub fn from_response(status: u16, body: Bytes) -> Self {
        let server = serde_json::from_slice::<ServerErrorBody>(&body).ok();
        let message = match &server {
            Some(server) if server.reason.is_empty() => server.error.clone(),
            Some(server) => format!("{}: {}", server.error, server.reason),
            None => http::StatusCode::from_u16(status)
                .ok()
                .and_then(|code| code.canonical_reason())
                .unwrap_or("unexpected status")
                .to_string(),
        };
        Self::Http {
            status,
            message,
            server,
            body: (!body.is_empty()).then_some(body),
        }
    }

    /// Create a body decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a JSON deserialization error with pointer context.
    #[must_use]
    pub fn json_deserialization(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            pointer: pointer.into(),
            message: message.into(),
            body: None,
        }
    }

    /// Wrap this error with the name of the operation that raised it.
    ///
    /// Already wrapped errors are returned unchanged.
    #[must_use]
    pub fn in_operation(self, operation: &'static str) -> Self {
        match self {
            wrapped @ Self::Operation { .. } => wrapped,
            other => Self::Operation {
                operation,
                source: Box::new(other),
            },
        }
    }

    /// The error with any operation wrapper removed.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// The operation that raised this error, if known.
    #[must_use]
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Operation { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::InvalidArgument(_) | Self::InvalidUrl(_) | Self::QuerySerialization(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Encode(_) | Self::JsonSerialization(_) => ErrorKind::EncodeError,
            Self::Connection(_) | Self::Tls(_) => ErrorKind::TransportError,
            Self::Timeout => ErrorKind::Timeout,
            Self::Auth { .. } => ErrorKind::AuthError,
            Self::Http { status, .. } => match status {
                401 => ErrorKind::AuthError,
                429 => ErrorKind::RateLimited,
                500.. => ErrorKind::ServerError,
                _ => ErrorKind::ClientError,
            },
            Self::JsonDeserialization { .. } | Self::Decode(_) => ErrorKind::DecodeError,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Operation { source, .. } => source.kind(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Timeout)
    }

    /// Returns `true` if this is a connection or TLS error.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self.root(), Self::Connection(_) | Self::Tls(_))
    }

    /// Returns the HTTP status code if this is an HTTP or authentication error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Http { status, .. } => Some(*status),
            Self::Auth { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::Http { status: 404, .. })
    }

    /// Returns the decoded server error document, if any.
    #[must_use]
    pub fn server_error(&self) -> Option<&ServerErrorBody> {
        match self.root() {
            Self::Http { server, .. } => server.as_ref(),
            _ => None,
        }
    }

    /// Returns the raw response body carried by this error.
    #[must_use]
    pub fn raw_body(&self) -> Option<&Bytes> {
        match self.root() {
            Self::Http { body, .. } | Self::JsonDeserialization { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
