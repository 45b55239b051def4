//! Full-text search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

/// Response of a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Number of matches.
    pub total_rows: u64,
    /// Token for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
    /// Field the results were grouped by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// Facet counts by field and value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<String, BTreeMap<String, u64>>>,
    /// Range facet counts by field and range name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranges: Option<BTreeMap<String, BTreeMap<String, u64>>>,
    /// Matches, when results are not grouped.
    #[serde(default)]
    pub rows: Vec<SearchResultRow>,
    /// Groups, when `group_field` was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<SearchResultGroup>>,
}

/// One group of grouped search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultGroup {
    /// Matches in the group.
    pub total_rows: u64,
    /// Group value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// Matches.
    #[serde(default)]
    pub rows: Vec<SearchResultRow>,
}

/// One search match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultRow {
    /// Matching document ID.
    pub id: String,
    /// Stored fields.
    #[serde(default)]
    pub fields: Value,
    /// Highlighted fragments by field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<BTreeMap<String, Vec<String>>>,
    /// The document, when `include_docs` was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
}

/// Response of `_search_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInfoResult {
    /// Index name.
    pub name: String,
    /// Index state.
    pub search_index: SearchIndexInfo,
}

/// State of a search index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexInfo {
    /// Committed sequence.
    pub committed_seq: u64,
    /// Size on disk in bytes.
    pub disk_size: u64,
    /// Indexed documents.
    pub doc_count: u64,
    /// Deleted documents.
    pub doc_del_count: u64,
    /// Pending sequence.
    pub pending_seq: u64,
    /// Index signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Response of `_search_analyze`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchAnalyzeResult {
    /// Tokens produced by the analyzer.
    pub tokens: Vec<String>,
}
