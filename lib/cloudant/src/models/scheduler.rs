//! Replication scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::string_enum! {
    /// State of a scheduled replication.
    pub enum SchedulerState {
        /// Being set up.
        Initializing => "initializing",
        /// Failed to start.
        Error => "error",
        /// Waiting to run.
        Pending => "pending",
        /// Running.
        Running => "running",
        /// Failing repeatedly.
        Crashing => "crashing",
        /// Finished.
        Completed => "completed",
        /// Failed permanently.
        Failed => "failed",
    }
}

/// Response of `/_scheduler/docs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerDocsResult {
    /// Number of documents.
    pub total_rows: u64,
    /// The documents.
    pub docs: Vec<SchedulerDocument>,
}

/// Scheduler view of a replication document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerDocument {
    /// Replicator database.
    pub database: String,
    /// Replication document ID.
    pub doc_id: String,
    /// Consecutive errors.
    #[serde(default)]
    pub error_count: u64,
    /// Replication ID.
    pub id: Option<String>,
    /// Progress details.
    pub info: Option<SchedulerInfo>,
    /// Last state change.
    pub last_updated: DateTime<Utc>,
    /// Node running the replication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Source URL, credentials removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Source proxy, credentials removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_proxy: Option<String>,
    /// Time the replication was added.
    pub start_time: DateTime<Utc>,
    /// Current state.
    pub state: SchedulerState,
    /// Target URL, credentials removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Target proxy, credentials removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_proxy: Option<String>,
}

/// Replication progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerInfo {
    /// Changes not yet processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes_pending: Option<u64>,
    /// Last checkpointed source sequence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpointed_source_seq: Option<String>,
    /// Failed document writes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_write_failures: Option<u64>,
    /// Documents read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_read: Option<u64>,
    /// Documents written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_written: Option<u64>,
    /// Last error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Missing revisions found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_revisions_found: Option<u64>,
    /// Revisions checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revisions_checked: Option<u64>,
    /// Source sequence reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_seq: Option<String>,
    /// Sequence processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub through_seq: Option<String>,
}

/// Response of `/_scheduler/jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerJobsResult {
    /// Number of jobs.
    pub total_rows: u64,
    /// The jobs.
    pub jobs: Vec<SchedulerJob>,
}

/// A running replication job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerJob {
    /// Replicator database, for document-based jobs.
    pub database: Option<String>,
    /// Replication document ID.
    pub doc_id: Option<String>,
    /// Recent events, newest first.
    pub history: Vec<SchedulerJobEvent>,
    /// Replication ID.
    pub id: String,
    /// Progress details.
    pub info: SchedulerInfo,
    /// Node running the job.
    pub node: String,
    /// Process ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    /// Source URL, credentials removed.
    pub source: String,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// Target URL, credentials removed.
    pub target: String,
    /// Owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// An event in a job's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerJobEvent {
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Event time.
    pub timestamp: DateTime<Utc>,
    /// Event kind, e.g. `started` or `crashed`.
    #[serde(rename = "type")]
    pub event_type: String,
}
