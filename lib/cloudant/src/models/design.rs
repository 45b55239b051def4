//! Design documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Analyzer, Attachment, ContentInformationSizes, DocumentRevisionStatus, Revisions};

/// A design document holding views and search indexes.
///
/// Fields the library does not declare, such as `filters` or `lists`, stay
/// in the property bag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, crate::OpenRecord)]
pub struct DesignDocument {
    /// Inline or stub attachments by name.
    #[serde(rename = "_attachments", skip_serializing_if = "Option::is_none")]
    pub attachments: Option<BTreeMap<String, Attachment>>,
    /// Conflicting revisions.
    #[serde(rename = "_conflicts", skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<String>>,
    /// Deletion marker.
    #[serde(rename = "_deleted", skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// Deleted conflicting revisions.
    #[serde(rename = "_deleted_conflicts", skip_serializing_if = "Option::is_none")]
    pub deleted_conflicts: Option<Vec<String>>,
    /// Document ID, `_design/<name>`.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sequence of the last update.
    #[serde(rename = "_local_seq", skip_serializing_if = "Option::is_none")]
    pub local_seq: Option<String>,
    /// Revision.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Revision history.
    #[serde(rename = "_revisions", skip_serializing_if = "Option::is_none")]
    pub revisions: Option<Revisions>,
    /// Availability of past revisions.
    #[serde(rename = "_revs_info", skip_serializing_if = "Option::is_none")]
    pub revs_info: Option<Vec<DocumentRevisionStatus>>,
    /// Rebuild indexes automatically.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoupdate: Option<bool>,
    /// Search indexes by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<BTreeMap<String, SearchIndexDefinition>>,
    /// Language of the functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Index options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<DesignDocumentOptions>,
    /// Validation function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validate_doc_update: Option<String>,
    /// Views by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<BTreeMap<String, DesignDocumentViewsMapReduce>>,
    #[serde(flatten)]
    #[open(properties)]
    properties: Map<String, Value>,
}

/// Index options of a design document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocumentOptions {
    /// Indexes are partitioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<bool>,
}

/// A view definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocumentViewsMapReduce {
    /// Map function.
    pub map: String,
    /// Reduce function or built-in reducer name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
}

/// A search index definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexDefinition {
    /// Analyzer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<Analyzer>,
    /// Index function.
    pub index: String,
}

/// Response of `GET /{db}/_design/{ddoc}/_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocumentInformation {
    /// Design document name.
    pub name: String,
    /// View index state.
    pub view_index: DesignDocumentViewIndex,
}

/// State of a design document's view index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignDocumentViewIndex {
    /// A compaction is in progress.
    pub compact_running: bool,
    /// Language of the functions.
    pub language: String,
    /// Index signature.
    pub signature: String,
    /// Sizes in bytes.
    pub sizes: ContentInformationSizes,
    /// The index is being built.
    pub updater_running: bool,
    /// Clients waiting for the index.
    pub waiting_clients: u64,
    /// Commits waiting.
    pub waiting_commit: bool,
    /// Pending updates by kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updates_pending: Option<UpdatesPending>,
}

/// Pending index updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatesPending {
    /// Global updates.
    pub minimum: u64,
    /// Preferred updates.
    pub preferred: u64,
    /// Total updates.
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;
    use crate::OpenRecord;

    #[test]
    fn keeps_undeclared_sections() {
        let wire = json!({
            "_id": "_design/orders",
            "views": {"by_total": {"map": "function (doc) { emit(doc.total); }", "reduce": "_sum"}},
            "filters": {"big": "function (doc) { return doc.total > 100; }"}
        });

        let ddoc: DesignDocument = serde_json::from_value(wire.clone()).expect("decode");

        check!(ddoc.views.as_ref().is_some_and(|views| views.contains_key("by_total")));
        check!(ddoc.property("filters").is_some());
        check!(serde_json::to_value(&ddoc).expect("encode") == wire);
    }
}
