//! Response modes.
//!
//! Each operation is typed by how its response is consumed:
//!
//! - [`Json<T>`] buffers the body, decompresses it and decodes `T`.
//! - [`Streamed`] hands the body to the caller chunk by chunk.
//! - [`HeadOnly`] keeps status and headers and discards the body.
//!
//! In every mode a non-2xx status is turned into an [`Error::Http`] carrying
//! the decoded server error document when one is present.

use std::future::Future;
use std::marker::PhantomData;

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_ENCODING;
use serde::de::DeserializeOwned;

use crate::{Body, Error, Response, Result, decompress, from_json};

/// How a response is consumed.
pub trait ResponseMode: Send + 'static {
    /// What the caller receives on success.
    type Output: Send;

    /// Default `Accept` header.
    const ACCEPT: &'static str;

    /// Whether the body is buffered before being handed over. Buffered modes
    /// advertise `Accept-Encoding: gzip`; streamed modes leave the body as sent.
    const BUFFERED: bool;

    /// Turn a raw response into the caller's output.
    fn handle(response: Response<Body>) -> impl Future<Output = Result<Self::Output>> + Send;
}

/// Decode a buffered JSON body into `T`.
#[derive(Debug)]
pub struct Json<T>(PhantomData<fn() -> T>);

/// Hand the streaming body to the caller.
#[derive(Debug)]
pub struct Streamed;

/// Keep status and headers only.
#[derive(Debug)]
pub struct HeadOnly;

impl<T> ResponseMode for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Output = T;

    const ACCEPT: &'static str = "application/json";
    const BUFFERED: bool = true;

    async fn handle(response: Response<Body>) -> Result<T> {
        let (status, headers, body) = response.into_parts();
        let bytes = read_body(&headers, body).await?;
        if !(200..300).contains(&status) {
            return Err(Error::from_response(status, bytes));
        }
        from_json(&bytes)
    }
}

impl ResponseMode for Streamed {
    type Output = Response<Body>;

    const ACCEPT: &'static str = "application/json";
    const BUFFERED: bool = false;

    async fn handle(response: Response<Body>) -> Result<Response<Body>> {
        if response.is_success() {
            return Ok(response);
        }
        let (status, headers, body) = response.into_parts();
        let bytes = read_body(&headers, body).await?;
        Err(Error::from_response(status, bytes))
    }
}

impl ResponseMode for HeadOnly {
    type Output = Response<()>;

    const ACCEPT: &'static str = "application/json";
    const BUFFERED: bool = true;

    async fn handle(response: Response<Body>) -> Result<Response<()>> {
        let (status, headers, mut body) = response.into_parts();
        body.close();
        if !(200..300).contains(&status) {
            return Err(Error::from_response(status, Bytes::new()));
        }
        Ok(Response::new(status, headers, ()))
    }
}

/// Buffer a body and undo its `Content-Encoding`.
async fn read_body(headers: &HeaderMap, body: Body) -> Result<Bytes> {
    let bytes = body.collect().await?;
    match headers.get(CONTENT_ENCODING).and_then(|v| v.to_str().ok()) {
        Some(encoding) => decompress(encoding, bytes),
        None => Ok(bytes),
    }
}
