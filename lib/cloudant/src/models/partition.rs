//! Partition information.

use serde::{Deserialize, Serialize};

/// Response of `GET /{db}/_partition/{partition_key}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInformation {
    /// Database name.
    pub db_name: String,
    /// Live documents in the partition.
    pub doc_count: u64,
    /// Deleted documents in the partition.
    pub doc_del_count: u64,
    /// Partition key.
    pub partition: String,
    /// Partitioned index usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned_indexes: Option<PartitionedIndexesInformation>,
    /// Sizes in bytes.
    pub sizes: PartitionInformationSizes,
}

/// Sizes of a partition in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInformationSizes {
    /// Live data.
    pub active: u64,
    /// Uncompressed data.
    pub external: u64,
}

/// Partitioned index usage against the account limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionedIndexesInformation {
    /// Indexes in use.
    pub count: u64,
    /// Indexes by kind.
    #[serde(default)]
    pub indexes: PartitionedIndexesDetailedInformation,
    /// Maximum allowed.
    pub limit: u64,
}

/// Partitioned indexes by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionedIndexesDetailedInformation {
    /// Search indexes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<u64>,
    /// View indexes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<u64>,
}
