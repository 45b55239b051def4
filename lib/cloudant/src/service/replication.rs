//! Replicator database and scheduler endpoints.

use http::header::{IF_MATCH, IF_NONE_MATCH};

use crate::models::{
    Batch, DocumentResult, ReplicationDocument, SchedulerDocsResult, SchedulerDocument,
    SchedulerJob, SchedulerJobsResult, SchedulerState,
};
use crate::{CloudantClient, HeadOnly, Json, Method, Operation, Query, Response, Result};

const REPLICATOR_PATH: &str = "/_replicator/{doc_id}";

options! {
    /// Options of [`CloudantClient::get_replication_document`].
    #[derive(Query)]
    pub struct GetReplicationDocumentOptions {
        /// Replication document ID.
        #[query(skip)]
        doc_id: String,
        ;
        /// Only return the document if its revision differs.
        #[query(skip)]
        if_none_match: String => with_if_none_match,
        /// Include conflicting revisions.
        conflicts: bool => with_conflicts,
        /// Include the revision history.
        revs: bool => with_revs,
        /// Revision to read.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::head_replication_document`].
    pub struct HeadReplicationDocumentOptions {
        /// Replication document ID.
        doc_id: String,
        ;
        /// Only succeed if the revision differs.
        if_none_match: String => with_if_none_match,
    }
}

options! {
    /// Options of [`CloudantClient::put_replication_document`].
    #[derive(Query)]
    pub struct PutReplicationDocumentOptions {
        /// Replication document ID.
        #[query(skip)]
        doc_id: String,
        /// The replication to run.
        #[query(skip)]
        replication_document: ReplicationDocument,
        ;
        /// Revision being replaced, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// Write mode.
        batch: Batch => with_batch,
        /// `false` to store the revision as given.
        new_edits: bool => with_new_edits,
        /// Revision being replaced.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::delete_replication_document`].
    #[derive(Query)]
    pub struct DeleteReplicationDocumentOptions {
        /// Replication document ID.
        #[query(skip)]
        doc_id: String,
        ;
        /// Revision being deleted, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// Write mode.
        batch: Batch => with_batch,
        /// Revision being deleted.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::get_scheduler_docs`].
    #[derive(Default, Query)]
    pub struct GetSchedulerDocsOptions {
        ;
        /// Maximum number of documents.
        limit: u64 => with_limit,
        /// Documents to skip.
        skip: u64 => with_skip,
        /// Only documents in these states.
        #[query(format = "csv")]
        states: Vec<SchedulerState> => with_states,
    }
}

options! {
    /// Options of [`CloudantClient::get_scheduler_document`].
    pub struct GetSchedulerDocumentOptions {
        /// Replication document ID.
        doc_id: String,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::get_scheduler_jobs`].
    #[derive(Default, Query)]
    pub struct GetSchedulerJobsOptions {
        ;
        /// Maximum number of jobs.
        limit: u64 => with_limit,
        /// Jobs to skip.
        skip: u64 => with_skip,
    }
}

options! {
    /// Options of [`CloudantClient::get_scheduler_job`].
    pub struct GetSchedulerJobOptions {
        /// Replication job ID.
        job_id: String,
        ;
    }
}

impl CloudantClient {
    /// Read a replication document.
    pub async fn get_replication_document(
        &self,
        options: &GetReplicationDocumentOptions,
    ) -> Result<ReplicationDocument> {
        let operation = Operation::<Json<ReplicationDocument>>::new(
            "getReplicationDocument",
            Method::Get,
            REPLICATOR_PATH,
        )
        .path("doc_id", &options.doc_id)
        .header(IF_NONE_MATCH, options.if_none_match.as_deref())
        .query(options);
        self.send(operation).await
    }

    /// Check that a replication document exists.
    pub async fn head_replication_document(
        &self,
        options: &HeadReplicationDocumentOptions,
    ) -> Result<Response<()>> {
        let operation =
            Operation::<HeadOnly>::new("headReplicationDocument", Method::Head, REPLICATOR_PATH)
                .path("doc_id", &options.doc_id)
                .header(IF_NONE_MATCH, options.if_none_match.as_deref());
        self.send(operation).await
    }

    /// Create or replace a replication document, starting the replication.
    pub async fn put_replication_document(
        &self,
        options: &PutReplicationDocumentOptions,
    ) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "putReplicationDocument",
            Method::Put,
            REPLICATOR_PATH,
        )
        .path("doc_id", &options.doc_id)
        .header(IF_MATCH, options.if_match.as_deref())
        .query(options)
        .json_body(&options.replication_document);
        self.send(operation).await
    }

    /// Delete a replication document, cancelling the replication.
    pub async fn delete_replication_document(
        &self,
        options: &DeleteReplicationDocumentOptions,
    ) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "deleteReplicationDocument",
            Method::Delete,
            REPLICATOR_PATH,
        )
        .path("doc_id", &options.doc_id)
        .header(IF_MATCH, options.if_match.as_deref())
        .query(options);
        self.send(operation).await
    }

    /// List the replication documents known to the scheduler.
    pub async fn get_scheduler_docs(
        &self,
        options: &GetSchedulerDocsOptions,
    ) -> Result<SchedulerDocsResult> {
        let operation = Operation::<Json<SchedulerDocsResult>>::new(
            "getSchedulerDocs",
            Method::Get,
            "/_scheduler/docs",
        )
        .query(options);
        self.send(operation).await
    }

    /// Read the scheduler state of a replication document.
    pub async fn get_scheduler_document(
        &self,
        options: &GetSchedulerDocumentOptions,
    ) -> Result<SchedulerDocument> {
        let operation = Operation::<Json<SchedulerDocument>>::new(
            "getSchedulerDocument",
            Method::Get,
            "/_scheduler/docs/_replicator/{doc_id}",
        )
        .path("doc_id", &options.doc_id);
        self.send(operation).await
    }

    /// List the running replication jobs.
    pub async fn get_scheduler_jobs(
        &self,
        options: &GetSchedulerJobsOptions,
    ) -> Result<SchedulerJobsResult> {
        let operation = Operation::<Json<SchedulerJobsResult>>::new(
            "getSchedulerJobs",
            Method::Get,
            "/_scheduler/jobs",
        )
        .query(options);
        self.send(operation).await
    }

    /// Read a replication job.
    pub async fn get_scheduler_job(
        &self,
        options: &GetSchedulerJobOptions,
    ) -> Result<SchedulerJob> {
        let operation = Operation::<Json<SchedulerJob>>::new(
            "getSchedulerJob",
            Method::Get,
            "/_scheduler/jobs/{job_id}",
        )
        .path("job_id", &options.job_id);
        self.send(operation).await
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;
    use crate::ToQueryPairs;

    #[test]
    fn scheduler_states_are_comma_separated() {
        let options = GetSchedulerDocsOptions::new()
            .with_limit(10_u64)
            .with_states(vec![SchedulerState::Running, SchedulerState::Failed]);

        check!(
            options.to_query_pairs().expect("pairs")
                == vec![
                    ("limit".to_string(), "10".to_string()),
                    ("states".to_string(), "running,failed".to_string()),
                ]
        );
    }
}
