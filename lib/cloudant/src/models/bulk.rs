//! Bulk document reads and writes.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{Document, DocumentResult};

/// Request body of `_bulk_docs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkDocs {
    /// Documents to write.
    pub docs: Vec<Document>,
    /// `false` to store revisions as given (replication mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_edits: Option<bool>,
}

impl BulkDocs {
    /// Write `docs` with server-assigned revisions.
    #[must_use]
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs,
            new_edits: None,
        }
    }
}

/// One document requested from `_bulk_get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkGetQueryDocument {
    /// Document ID.
    pub id: String,
    /// Revision to read; the winning revision when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Only inline attachments changed after these revisions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atts_since: Option<Vec<String>>,
}

impl BulkGetQueryDocument {
    /// Request the winning revision of `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Response of `_bulk_get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkGetResult {
    /// One item per requested document.
    pub results: Vec<BulkGetResultItem>,
}

/// All revisions returned for one requested document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkGetResultItem {
    /// Document ID.
    pub id: String,
    /// One entry per revision.
    pub docs: Vec<BulkGetResultDocument>,
}

/// One revision read by `_bulk_get`: either the document or why it could not
/// be read.
///
/// On the wire this is `{"ok": Document}` or `{"error": DocumentResult}`;
/// an object with both keys or neither is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkGetResultDocument {
    /// The document.
    Ok(Document),
    /// The failure.
    Error(DocumentResult),
}

impl BulkGetResultDocument {
    /// The document, if it was read.
    #[must_use]
    pub fn ok(&self) -> Option<&Document> {
        match self {
            Self::Ok(doc) => Some(doc),
            Self::Error(_) => None,
        }
    }

    /// The failure, if the read failed.
    #[must_use]
    pub fn error(&self) -> Option<&DocumentResult> {
        match self {
            Self::Ok(_) => None,
            Self::Error(error) => Some(error),
        }
    }
}

impl Serialize for BulkGetResultDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::Ok(doc) => map.serialize_entry("ok", doc)?,
            Self::Error(error) => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BulkGetResultDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;
        match (object.remove("ok"), object.remove("error")) {
            (Some(doc), None) => serde_json::from_value(doc)
                .map(Self::Ok)
                .map_err(D::Error::custom),
            (None, Some(error)) => serde_json::from_value(error)
                .map(Self::Error)
                .map_err(D::Error::custom),
            (Some(_), Some(_)) => Err(D::Error::custom(
                "bulk get result has both `ok` and `error`",
            )),
            (None, None) => Err(D::Error::custom(
                "bulk get result has neither `ok` nor `error`",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn picks_variant_by_key() {
        let result: BulkGetResultItem = serde_json::from_value(json!({
            "id": "order-1",
            "docs": [
                {"ok": {"_id": "order-1", "_rev": "1-a", "total": 12}},
                {"error": {"id": "order-1", "rev": "2-b", "error": "not_found", "reason": "missing"}}
            ]
        }))
        .expect("decode");

        let_assert!([first, second] = result.docs.as_slice());
        let_assert!(Some(doc) = first.ok());
        check!(doc.rev.as_deref() == Some("1-a"));
        let_assert!(Some(error) = second.error());
        check!(error.error.as_deref() == Some("not_found"));
    }

    #[test]
    fn rejects_both_or_neither() {
        let both = serde_json::from_value::<BulkGetResultDocument>(json!({
            "ok": {"_id": "a"},
            "error": {"id": "a", "error": "x"}
        }));
        check!(both.is_err());

        let neither = serde_json::from_value::<BulkGetResultDocument>(json!({"missing": true}));
        check!(neither.is_err());
    }

    #[test]
    fn encodes_single_key() {
        let item = BulkGetResultDocument::Ok(Document::with_id("a"));
        check!(serde_json::to_value(&item).expect("encode") == json!({"ok": {"_id": "a"}}));
    }
}
