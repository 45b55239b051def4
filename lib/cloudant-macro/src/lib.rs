//! Derive macros for the Cloudant client models.
//!
//! This crate provides:
//! - `#[derive(Query)]` - Derive `ToQueryPairs` for an operation's query parameters
//! - `#[derive(OpenRecord)]` - Derive `OpenRecord` for records with extra properties
//!
//! The generated code refers to the `cloudant` crate by absolute path.

mod open_record;
mod query_derive;

use proc_macro::TokenStream;

/// Derive the `ToQueryPairs` trait for a struct.
///
/// This generates a method to convert the struct into query parameter pairs.
/// `Option<T>` fields are omitted when `None`; empty `Vec<T>` fields are omitted.
///
/// # Field Attributes
///
/// - `#[query(skip)]` - Not a query parameter (path, header or body input)
/// - `#[query(rename = "name")]` - Use a different parameter name
/// - `#[query(format = "...")]` - Value format:
///   - `multi` (default): `Display` of the value, one pair per `Vec` element
///   - `csv`: `Vec` elements joined with commas into one pair
///   - `json`: the value encoded as JSON (keys, key ranges)
///
/// # Example
///
/// ```ignore
/// use cloudant::Query;
///
/// #[derive(Query)]
/// struct GetAllDbsOptions {
///     descending: Option<bool>,
///     #[query(format = "json")]
///     start_key: Option<String>,
///     limit: Option<u64>,
/// }
/// ```
#[proc_macro_derive(Query, attributes(query))]
pub fn derive_query(input: TokenStream) -> TokenStream {
    query_derive::expand_query_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive the `OpenRecord` trait for a struct with an extra-properties bag.
///
/// Mark the bag (a `serde_json::Map<String, Value>` that is also
/// `#[serde(flatten)]`) with `#[open(properties)]`. Every other field is a
/// declared field; its wire name comes from `#[serde(rename = "...")]` when
/// present.
///
/// # Example
///
/// ```ignore
/// use cloudant::OpenRecord;
///
/// #[derive(Serialize, Deserialize, OpenRecord)]
/// pub struct Document {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<String>,
///     #[serde(flatten)]
///     #[open(properties)]
///     properties: Map<String, Value>,
/// }
/// ```
#[proc_macro_derive(OpenRecord, attributes(open))]
pub fn derive_open_record(input: TokenStream) -> TokenStream {
    open_record::expand_open_record_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
