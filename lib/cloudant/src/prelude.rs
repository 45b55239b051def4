//! Prelude module for convenient imports.
//!
//! ```ignore
//! use cloudant::prelude::*;
//! ```

pub use crate::models::*;
pub use crate::service::*;
pub use crate::{
    Authentication, Body, CancellationToken, ClientConfig, CloudantClient, CloudantClientBuilder,
    ContentType, Error, ErrorKind, OpenRecord, Response, Result, StatusCode,
};
pub use serde::{Deserialize, Serialize};
pub use serde_json::{Value, json};
