//! Tower middleware layers for the Cloudant client.
//!
//! Every call goes through the same chain, outermost first:
//!
//! 1. [`RetryLayer`] with [`RetryPolicy`] - re-dispatches transient failures
//! 2. [`LoggingLayer`] - one `http_request` span per attempt
//! 3. [`AuthLayer`] - attaches credentials, replays once on a stale credential
//! 4. [`ConcurrencyLimitLayer`] - bounds requests in flight
//! 5. the transport
//!
//! Extra layers added with
//! [`CloudantClientBuilder::layer`](crate::CloudantClientBuilder::layer) wrap
//! the transport, inside the concurrency limit.
//!
//! # Example: Adding a Layer
//!
//! ```ignore
//! use cloudant::CloudantClient;
//! use cloudant::middleware::LoggingLayer;
//!
//! let client = CloudantClient::builder()
//!     .base_url("https://account.cloudant.com")
//!     .layer(LoggingLayer::debug())
//!     .build()?;
//! ```

mod auth;
mod logging;
mod retry;

pub use auth::{AuthLayer, Authenticate};
pub use logging::{LogLevel, Logging, LoggingLayer};
pub use retry::{CallDeadline, RetryConfig, RetryPolicy};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};

// Re-export tower middleware layers
pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::retry::RetryLayer;
