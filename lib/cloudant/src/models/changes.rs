//! Changes feed.

use serde::{Deserialize, Serialize};

use super::Document;

crate::string_enum! {
    /// Changes feed kind.
    pub enum ChangesFeed {
        /// Return the changes and close.
        Normal => "normal",
        /// Wait for at least one change.
        Longpoll => "longpoll",
        /// Keep the connection open, one change per line.
        Continuous => "continuous",
        /// Server-sent events.
        Eventsource => "eventsource",
    }
}

crate::string_enum! {
    /// Revisions listed per change.
    pub enum ChangesStyle {
        /// Only the winning revision.
        MainOnly => "main_only",
        /// Every leaf revision.
        AllDocs => "all_docs",
    }
}

/// Response of a non-continuous changes request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangesResult {
    /// Sequence to resume from.
    pub last_seq: String,
    /// Changes not yet returned.
    #[serde(default)]
    pub pending: u64,
    /// The changes.
    pub results: Vec<ChangesResultItem>,
}

/// One changed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangesResultItem {
    /// Changed revisions.
    pub changes: Vec<Change>,
    /// The document was deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    /// The document, when `include_docs` was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
    /// Document ID.
    pub id: String,
    /// Change sequence.
    pub seq: String,
}

/// A changed revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Revision.
    pub rev: String,
}
