//! Database information.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PartitionedIndexesInformation;

/// Plain `{"ok": true}` acknowledgement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResult {
    /// Success marker.
    pub ok: bool,
}

/// Response of `GET /{db}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInformation {
    /// Sharding parameters.
    pub cluster: DatabaseInformationCluster,
    /// Last committed sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_update_seq: Option<String>,
    /// A compaction is in progress.
    #[serde(default)]
    pub compact_running: bool,
    /// Sequence the last compaction reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compacted_seq: Option<String>,
    /// Database name.
    pub db_name: String,
    /// On-disk format version.
    #[serde(default)]
    pub disk_format_version: u64,
    /// Live documents.
    pub doc_count: u64,
    /// Deleted documents.
    pub doc_del_count: u64,
    /// Storage engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Creation properties.
    #[serde(default)]
    pub props: DatabaseInformationProps,
    /// Sizes in bytes.
    pub sizes: ContentInformationSizes,
    /// Current update sequence.
    pub update_seq: String,
    /// Database UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Partitioned index usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned_indexes: Option<PartitionedIndexesInformation>,
}

/// Sharding parameters of a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInformationCluster {
    /// Replicas.
    pub n: u64,
    /// Shards.
    pub q: u64,
    /// Read quorum.
    pub r: u64,
    /// Write quorum.
    pub w: u64,
}

/// Properties a database was created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInformationProps {
    /// The database is partitioned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<bool>,
}

/// Sizes in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInformationSizes {
    /// Live data.
    pub active: u64,
    /// Uncompressed data.
    pub external: u64,
    /// File size.
    pub file: u64,
}

/// Missing revisions of one document, from `_revs_diff`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevsDiff {
    /// Revisions the database does not have.
    #[serde(default)]
    pub missing: Vec<String>,
    /// Stored revisions that may be ancestors of the missing ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub possible_ancestors: Vec<String>,
}

/// Shard ranges and the nodes holding them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardsInformation {
    /// Nodes by shard range.
    pub shards: BTreeMap<String, Vec<String>>,
}

/// The shard holding one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentShardInfo {
    /// Nodes holding the shard.
    pub nodes: Vec<String>,
    /// Shard range.
    pub range: String,
}
