//! Mango queries and indexes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

crate::string_enum! {
    /// Kind of a query index.
    pub enum IndexType {
        /// JSON index.
        Json => "json",
        /// Built-in `_all_docs` index.
        Special => "special",
        /// Full-text index.
        Text => "text",
        /// Nouveau full-text index.
        Nouveau => "nouveau",
    }
}

crate::string_enum! {
    /// Outcome of an index creation request.
    pub enum IndexResultStatus {
        /// A new index was built.
        Created => "created",
        /// An identical index already existed.
        Exists => "exists",
    }
}

/// A field of an index definition.
///
/// Either `{"name": <field>, "type": <type>}` for text indexes or
/// `{<field>: "asc" | "desc"}` for JSON indexes.
pub type IndexField = BTreeMap<String, String>;

/// A text analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analyzer {
    /// Analyzer name, e.g. `standard` or `keyword`.
    pub name: String,
    /// Words to ignore.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
}

impl Analyzer {
    /// The analyzer called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stopwords: None,
        }
    }
}

/// Default-field settings of a text index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTextOperatorDefaultField {
    /// Analyzer of the default field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<Analyzer>,
    /// Index a default field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// What an index covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Default analyzer of a text index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_analyzer: Option<Analyzer>,
    /// Default field of a text index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_field: Option<IndexTextOperatorDefaultField>,
    /// Indexed fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<IndexField>,
    /// Index array lengths in a text index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_array_lengths: Option<bool>,
    /// Only documents matching this selector are indexed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_filter_selector: Option<Value>,
}

/// An index of the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexInformation {
    /// Design document holding the index; absent for `_all_docs`.
    pub ddoc: Option<String>,
    /// Index definition, `def` on the wire.
    #[serde(rename = "def")]
    pub definition: IndexDefinition,
    /// Index name.
    pub name: String,
    /// The index is partitioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<bool>,
    /// Index kind.
    #[serde(rename = "type")]
    pub index_type: Option<IndexType>,
}

/// Response of `GET /{db}/_index`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexesInformation {
    /// Number of indexes.
    pub total_rows: u64,
    /// The indexes.
    pub indexes: Vec<IndexInformation>,
}

/// Response of `POST /{db}/_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexResult {
    /// Design document ID.
    pub id: String,
    /// Index name.
    pub name: String,
    /// Whether the index was created.
    pub result: IndexResultStatus,
}

/// Response of `_find`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindResult {
    /// Token for the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
    /// Matching documents.
    pub docs: Vec<Document>,
    /// Statistics, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_stats: Option<ExecutionStats>,
    /// Advice about the query, e.g. no matching index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Query execution statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Time spent, in milliseconds.
    pub execution_time_ms: f64,
    /// Documents returned.
    pub results_returned: u64,
    /// Documents read.
    pub total_docs_examined: u64,
    /// Index keys read.
    pub total_keys_examined: u64,
    /// Documents read with quorum.
    #[serde(default)]
    pub total_quorum_docs_examined: u64,
}

/// Response of `_explain`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainResult {
    /// Database name.
    pub dbname: String,
    /// Projected fields, or `"all_fields"`.
    #[serde(default)]
    pub fields: Value,
    /// Index the query would use.
    pub index: IndexInformation,
    /// Effective limit.
    pub limit: u64,
    /// Effective options.
    #[serde(default)]
    pub opts: Value,
    /// Map/reduce arguments used against a view index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mrargs: Option<Value>,
    /// The query was partitioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<Value>,
    /// Effective selector.
    pub selector: Value,
    /// Effective skip.
    pub skip: u64,
}
