//! Provisioned throughput capacity.

use serde::{Deserialize, Serialize};

/// Response of `/_api/v2/user/capacity/throughput`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityThroughputInformation {
    /// Capacity in effect.
    pub current: ThroughputCapacity,
    /// Capacity being moved to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ThroughputCapacity>,
}

/// Wrapper of a throughput figure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputCapacity {
    /// The figures.
    pub throughput: ThroughputInformation,
}

/// Operations per second by class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThroughputInformation {
    /// Provisioned blocks.
    pub blocks: u64,
    /// Global queries.
    pub query: u64,
    /// Reads.
    pub read: u64,
    /// Writes.
    pub write: u64,
}
