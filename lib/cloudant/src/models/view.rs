//! View queries and results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

crate::string_enum! {
    /// When a view index is brought up to date relative to a query.
    pub enum ViewUpdate {
        /// Before responding.
        True => "true",
        /// Never; stale results are fine.
        False => "false",
        /// After responding.
        Lazy => "lazy",
    }
}

/// One view query inside a multi-query request.
///
/// Keys are arbitrary JSON values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewQuery {
    /// Include encoding information of attachment stubs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub att_encoding_info: Option<bool>,
    /// Inline attachment content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<bool>,
    /// Include conflict information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<bool>,
    /// Reverse the order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descending: Option<bool>,
    /// Include the full documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_docs: Option<bool>,
    /// Include rows matching `end_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusive_end: Option<bool>,
    /// Maximum number of rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Rows to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    /// Include the database update sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<bool>,
    /// Stop at this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_key: Option<Value>,
    /// Stop at this document ID within `end_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_key_doc_id: Option<String>,
    /// Group reduce results by key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
    /// Group array keys by their first elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_level: Option<u64>,
    /// Return only this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    /// Return only these keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<Value>>,
    /// Run the reduce function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce: Option<bool>,
    /// Prefer a stable shard set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable: Option<bool>,
    /// Start at this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_key: Option<Value>,
    /// Start at this document ID within `start_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_key_doc_id: Option<String>,
    /// Index freshness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<ViewUpdate>,
}

/// Result of a view query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResult {
    /// Rows in the index; absent for reduced results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// Database update sequence, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<String>,
    /// Result rows.
    pub rows: Vec<ViewResultRow>,
}

/// Results of a multi-query view request, in query order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewQueriesResult {
    /// One result per query.
    pub results: Vec<ViewResult>,
}

/// One view row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewResultRow {
    /// Emitting document; absent for reduced rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Emitted key.
    #[serde(default)]
    pub key: Value,
    /// Emitted value.
    #[serde(default)]
    pub value: Value,
    /// The document, when `include_docs` was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
    /// Error code for rows that could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Underlying cause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
}
