//! Documents, attachments and write results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::OpenRecord;

crate::string_enum! {
    /// Availability of a past revision.
    pub enum RevisionStatus {
        /// The revision body is stored.
        Available => "available",
        /// The revision body was compacted away.
        Missing => "missing",
        /// The revision is a deletion.
        Deleted => "deleted",
    }
}

crate::string_enum! {
    /// Write mode of a document write.
    pub enum Batch {
        /// Acknowledge before the write is committed.
        Ok => "ok",
    }
}

/// A database document.
///
/// Declared fields are the underscore-prefixed metadata; everything else is
/// a user property.
///
/// ```
/// use cloudant::{Document, OpenRecord};
///
/// let doc = Document::with_id("zebra")
///     .with_property("stripes", 42)
///     .unwrap();
/// assert_eq!(doc.property("stripes"), Some(&serde_json::json!(42)));
/// assert!(Document::default().with_property("_rev", "1-a").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, OpenRecord)]
pub struct Document {
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
    /// Document ID.
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
    #[serde(flatten)]
    #[open(properties)]
    properties: Map<String, Value>,
}

impl Document {
    /// An empty document with the given ID.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// Attachment metadata, with the content when inlined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Inline content, base64 on the wire.
    #[serde(
        default,
        with = "crate::base64_bytes::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Vec<u8>>,
    /// Content digest, `md5-<base64>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Compressed size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_length: Option<u64>,
    /// Compression codec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Content follows in a multipart body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follows: Option<bool>,
    /// Size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    /// Revision number the attachment was added in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    /// Metadata only, no content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stub: Option<bool>,
}

/// A document's revision history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revisions {
    /// Revision hashes, newest first.
    pub ids: Vec<String>,
    /// Generation of the newest revision.
    pub start: u64,
}

/// One entry of `_revs_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRevisionStatus {
    /// Revision.
    pub rev: String,
    /// Availability.
    pub status: RevisionStatus,
}

/// Result of a document write, or of one entry of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Document ID.
    pub id: String,
    /// New revision on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Success marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// Error code on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Underlying cause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
}

// ============================================================================
// All documents
// ============================================================================

/// One `_all_docs` query inside a multi-query request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDocsQuery {
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
    /// Stop at this document ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_key: Option<String>,
    /// Return only this document ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Return only these document IDs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    /// Start at this document ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_key: Option<String>,
}

/// Result of an `_all_docs` or `_design_docs` request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDocsResult {
    /// Number of documents in the database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    /// Result rows.
    pub rows: Vec<DocsResultRow>,
    /// Database update sequence, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_seq: Option<String>,
}

/// Results of a multi-query `_all_docs` request, in query order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDocsQueriesResult {
    /// One result per query.
    pub results: Vec<AllDocsResult>,
}

/// One `_all_docs` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocsResultRow {
    /// Document ID; absent for keys that were not found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Row key.
    pub key: String,
    /// Current revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<DocsResultRowValue>,
    /// The document, when `include_docs` was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
    /// Error code for keys that could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Underlying cause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<String>,
}

/// Value of an `_all_docs` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsResultRowValue {
    /// Current revision.
    pub rev: String,
    /// Set for deleted documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn document_keeps_user_properties() {
        let wire = json!({
            "_id": "zebra",
            "_rev": "1-abc",
            "stripes": 42,
            "habitat": {"continent": "africa"}
        });

        let doc: Document = serde_json::from_value(wire.clone()).expect("decode");

        check!(doc.id.as_deref() == Some("zebra"));
        check!(doc.property("stripes") == Some(&json!(42)));
        check!(doc.property("_rev").is_none());
        check!(serde_json::to_value(&doc).expect("encode") == wire);
    }

    #[test]
    fn declared_fields_cannot_be_properties() {
        let mut doc = Document::with_id("a");
        let_assert!(Err(error) = doc.set_property("_id", "b"));
        check!(error.kind() == crate::ErrorKind::InvalidArgument);
        check!(doc.id.as_deref() == Some("a"));
    }

    #[test]
    fn attachment_data_is_base64() {
        let attachment = Attachment {
            content_type: Some("text/plain".to_string()),
            data: Some(b"hello".to_vec()),
            ..Attachment::default()
        };

        let wire = serde_json::to_value(&attachment).expect("encode");

        check!(wire == json!({"content_type": "text/plain", "data": "aGVsbG8="}));
        let back: Attachment = serde_json::from_value(wire).expect("decode");
        check!(back == attachment);
    }

    #[test]
    fn unknown_revision_status_is_kept() {
        let status: DocumentRevisionStatus =
            serde_json::from_value(json!({"rev": "2-b", "status": "archived"})).expect("decode");
        check!(status.status == RevisionStatus::Unknown("archived".to_string()));
    }
}
