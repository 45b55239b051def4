//! Replication documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Attachment, DocumentRevisionStatus, Revisions, UserContext};

/// A document of the `_replicator` database describing one replication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, crate::OpenRecord)]
pub struct ReplicationDocument {
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
    /// Cancel the replication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel: Option<bool>,
    /// Milliseconds between checkpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_interval: Option<u64>,
    /// Request timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_timeout: Option<u64>,
    /// Keep replicating new changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous: Option<bool>,
    /// Create the target database if missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_target: Option<bool>,
    /// Parameters of the created target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_target_params: Option<ReplicationCreateTargetParameters>,
    /// Replicate only these documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_ids: Option<Vec<String>>,
    /// Filter function, `ddoc/name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Concurrent connections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_connections: Option<u64>,
    /// Replication owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Filter function parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<BTreeMap<String, String>>,
    /// Retries per request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries_per_request: Option<u64>,
    /// Replicate only documents matching this selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Value>,
    /// Sequence to start from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_seq: Option<String>,
    /// Erlang socket options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_options: Option<String>,
    /// Source database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ReplicationDatabase>,
    /// Proxy to reach the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_proxy: Option<String>,
    /// Target database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ReplicationDatabase>,
    /// Proxy to reach the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_proxy: Option<String>,
    /// Read with `_bulk_get`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_bulk_get: Option<bool>,
    /// Record checkpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_checkpoints: Option<bool>,
    /// User the replication runs as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ctx: Option<UserContext>,
    /// Replicate winning revisions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_revs_only: Option<bool>,
    /// Documents per batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_batch_size: Option<u64>,
    /// Worker processes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_processes: Option<u64>,
    #[serde(flatten)]
    #[open(properties)]
    properties: Map<String, Value>,
}

impl ReplicationDocument {
    /// A replication from `source` to `target`.
    #[must_use]
    pub fn new(source: ReplicationDatabase, target: ReplicationDatabase) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            ..Self::default()
        }
    }
}

/// Endpoint of a replication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationDatabase {
    /// Credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<ReplicationDatabaseAuth>,
    /// Extra request headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Database URL.
    pub url: String,
}

impl ReplicationDatabase {
    /// The database at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Credentials of a replication endpoint.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationDatabaseAuth {
    /// Basic credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic: Option<ReplicationDatabaseAuthBasic>,
    /// IAM credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iam: Option<ReplicationDatabaseAuthIam>,
}

impl std::fmt::Debug for ReplicationDatabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationDatabaseAuth")
            .field("basic", &self.basic.as_ref().map(|basic| &basic.username))
            .field("iam", &self.iam.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Basic credentials of a replication endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationDatabaseAuthBasic {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
}

/// IAM credentials of a replication endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationDatabaseAuthIam {
    /// API key.
    pub api_key: String,
}

/// Parameters of a target database created by a replication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationCreateTargetParameters {
    /// Replicas.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u64>,
    /// Create a partitioned database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned: Option<bool>,
    /// Shards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<u64>,
}
