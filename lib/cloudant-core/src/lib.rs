//! Core types and traits for the Cloudant client.
//!
//! This crate provides the foundational request pipeline types:
//! - [`Method`] - HTTP method enum
//! - [`Request`], [`RequestBuilder`] and [`RequestBody`] - outgoing requests
//! - [`Response`] and [`Body`] - responses with a streaming body handle
//! - [`Error`], [`ErrorKind`] and [`Result`] - error handling
//! - [`HttpClient`] - transport trait for HTTP execution
//! - [`Operation`] and [`ResponseMode`] - typed operation descriptors
//! - [`OpenRecord`], [`base64_bytes`] and [`string_enum!`] - model codec helpers
//! - [`ToQueryPairs`] - Trait for converting types to query parameter pairs
//! - [`PathTemplate`] - Original path template for middleware access

mod body;
mod client;
mod codec;
mod error;
mod method;
mod mode;
mod operation;
mod path;
pub mod prelude;
mod request;
mod response;

pub use body::{ContentType, decompress, from_json, gzip, gzip_stream, to_form, to_json};
pub use client::HttpClient;
pub use codec::{OpenRecord, base64_bytes};
pub use error::{Error, ErrorKind, Result, ServerErrorBody};
pub use method::Method;
pub use mode::{HeadOnly, Json, ResponseMode, Streamed};
pub use operation::{Operation, OperationName, RequestOptions};
pub use path::{PathTemplate, encode_segment};
pub use request::{ByteStream, Request, RequestBody, RequestBuilder};
pub use response::{Body, Response};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}

/// Trait for types that can be converted to query parameter pairs.
///
/// This is automatically implemented by the `#[derive(Query)]` macro.
///
/// # Example
///
/// ```ignore
/// use cloudant::Query;
///
/// #[derive(Query)]
/// struct AllDocsParams {
///     #[query(skip)]
///     db: String,
///     include_docs: Option<bool>,
///     #[query(format = "json")]
///     start_key: Option<String>,
///     #[query(format = "csv")]
///     states: Vec<String>,
/// }
/// ```
pub trait ToQueryPairs {
    /// Convert this type to a vector of key-value pairs for query parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if a JSON-formatted parameter fails to serialize.
    fn to_query_pairs(&self) -> Result<Vec<(String, String)>>;
}

