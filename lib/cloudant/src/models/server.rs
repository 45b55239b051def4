//! Server-level information.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DatabaseInformation;

crate::string_enum! {
    /// Node health reported by `/_up`.
    pub enum UpStatus {
        /// Serving traffic.
        Ok => "ok",
        /// Excluded from the load balancer.
        Nolb => "nolb",
        /// In maintenance mode.
        MaintenanceMode => "maintenance_mode",
    }
}

crate::string_enum! {
    /// Kind of database event in `_db_updates`.
    pub enum DbUpdateType {
        /// Database created.
        Created => "created",
        /// Database changed.
        Updated => "updated",
        /// Database deleted.
        Deleted => "deleted",
    }
}

/// Welcome message returned by `GET /`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInformation {
    /// Welcome text.
    pub couchdb: String,
    /// Enabled features.
    #[serde(default)]
    pub features: Vec<String>,
    /// Feature flags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features_flags: Vec<String>,
    /// Vendor details.
    pub vendor: ServerVendor,
    /// Server version.
    pub version: String,
}

/// Vendor block of [`ServerInformation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVendor {
    /// Vendor name.
    pub name: String,
    /// Product variant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Vendor version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Server-generated UUIDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UuidsResult {
    /// The UUIDs.
    pub uuids: Vec<String>,
}

/// Response of `/_up`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpInformation {
    /// Seed node status.
    #[serde(default)]
    pub seeds: Value,
    /// Node status.
    pub status: UpStatus,
}

/// A task running on the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTask {
    /// Changes processed so far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes_done: Option<u64>,
    /// Database the task runs on.
    pub database: String,
    /// Node running the task.
    pub node: String,
    /// Process ID.
    pub pid: String,
    /// Completion percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,
    /// Start time in Unix seconds, as the server sends it.
    pub started_on: u64,
    /// Human-readable status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Task identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    /// Total changes to process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_changes: Option<u64>,
    /// Task kind, e.g. `indexer` or `replication`.
    #[serde(rename = "type")]
    pub task_type: String,
    /// Time of the last progress update in Unix seconds.
    pub updated_on: u64,
}

/// One entry of `_dbs_info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbsInfoResult {
    /// Requested database name.
    pub key: String,
    /// Database information when the database exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<DatabaseInformation>,
    /// Error code otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Cluster membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipInformation {
    /// Every node the cluster knows about.
    pub all_nodes: Vec<String>,
    /// Nodes currently connected.
    pub cluster_nodes: Vec<String>,
}

/// Response of `_db_updates`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbUpdates {
    /// Sequence to resume from.
    pub last_seq: String,
    /// Database events.
    pub results: Vec<DbUpdatesResultItem>,
}

/// One database event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbUpdatesResultItem {
    /// Account owning the database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Database name.
    pub db_name: String,
    /// Event sequence.
    pub seq: String,
    /// Event kind.
    #[serde(rename = "type")]
    pub update_type: DbUpdateType,
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;

    #[test]
    fn active_task_timestamps_are_epoch_seconds() {
        let task: ActiveTask = serde_json::from_value(json!({
            "database": "orders",
            "node": "node1@127.0.0.1",
            "pid": "<0.1.0>",
            "started_on": 1_700_000_000,
            "type": "indexer",
            "updated_on": 1_700_000_060
        }))
        .expect("decode");

        check!(task.task_type == "indexer");
        check!(task.started_on == 1_700_000_000);
        check!(task.updated_on == 1_700_000_060);
        check!(serde_json::to_value(&task).expect("encode")["started_on"] == 1_700_000_000);
    }

    #[test]
    fn up_status_decodes() {
        let up: UpInformation =
            serde_json::from_value(json!({"status": "nolb", "seeds": {}})).expect("decode");
        check!(up.status == UpStatus::Nolb);
    }
}
