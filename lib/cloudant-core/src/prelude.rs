//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use cloudant_core::prelude::*;
//! ```

pub use crate::{
    Body, ContentType, Error, ErrorKind, HttpClient, Method, OpenRecord, Request, RequestBody,
    Response, Result, ToQueryPairs, from_json, to_json,
};
