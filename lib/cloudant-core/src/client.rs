//! HTTP client trait.
//!
//! [`HttpClient`] is the seam between the request pipeline and the network.
//! The default implementation is the hyper-based transport in the `cloudant`
//! crate; implement it directly to plug in a different transport or a fake
//! for tests.

use std::future::Future;

use crate::{Body, Request, Response, Result};

/// Core HTTP client trait.
///
/// Implementations perform exactly one exchange per call: no retries, no
/// authentication and no decompression. Those are layered on top.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response with a streaming body.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails before response headers arrive:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Body>>> + Send;
}

impl<C: HttpClient> HttpClient for std::sync::Arc<C> {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Body>>> + Send {
        C::execute(self, request)
    }
}
