//! Async client for the Cloudant and CouchDB HTTP API.
//!
//! Every endpoint is a method on [`CloudantClient`] taking a typed options
//! record. Requests run through a Tower middleware stack handling
//! authentication, retries and logging.
//!
//! # Example
//!
//! ```ignore
//! use cloudant::prelude::*;
//!
//! let client = CloudantClient::builder()
//!     .base_url("https://account.cloudant.com")
//!     .authentication(Authentication::iam(std::env::var("CLOUDANT_APIKEY")?))
//!     .build()?;
//!
//! let document = client
//!     .get_document(&GetDocumentOptions::new("orders", "order-1"))
//!     .await?;
//! ```

extern crate self as cloudant;

pub mod auth;
mod client;
mod config;
mod connector;
pub mod middleware;
pub mod models;
pub mod prelude;
mod service;
mod transport;

pub use auth::{Authentication, Authenticator};
pub use client::{CloudantClient, CloudantClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use models::*;
pub use service::*;
pub use transport::{BoxedService, HyperTransport, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

pub use tokio_util::sync::CancellationToken;

// Re-export core types
pub use cloudant_core::{
    Body, ByteStream, ContentType, Error, ErrorKind, HeadOnly, HttpClient, Json, Method,
    OpenRecord, Operation, OperationName, PathTemplate, Request, RequestBody, RequestBuilder,
    RequestOptions, Response, ResponseMode, Result, ServerErrorBody, Streamed, ToQueryPairs,
    base64_bytes, from_json, string_enum, to_form, to_json,
};

// Re-export http types for status codes and headers
pub use cloudant_core::{StatusCode, header};

// Re-export crates for macro-generated code
#[doc(hidden)]
pub use cloudant_core::__private;

// Re-export derives
pub use cloudant_macro::{OpenRecord, Query};
