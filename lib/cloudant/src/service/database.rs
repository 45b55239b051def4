//! Database endpoints.

use std::collections::BTreeMap;

use crate::models::{
    DatabaseInformation, DocumentShardInfo, OkResult, RevsDiff, Security, ShardsInformation,
};
use crate::{CloudantClient, HeadOnly, Json, Method, Operation, Query, Response, Result};

options! {
    /// Options naming a database.
    ///
    /// Used by [`CloudantClient::get_database_information`],
    /// [`CloudantClient::head_database`], [`CloudantClient::delete_database`],
    /// [`CloudantClient::get_security`] and
    /// [`CloudantClient::get_shards_information`].
    pub struct DatabaseOptions {
        /// Database name.
        db: String,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::put_database`].
    #[derive(Query)]
    pub struct PutDatabaseOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        ;
        /// Create a partitioned database.
        partitioned: bool => with_partitioned,
        /// Number of shards.
        q: u64 => with_q,
    }
}

options! {
    /// Options of [`CloudantClient::put_security`].
    pub struct PutSecurityOptions {
        /// Database name.
        db: String,
        /// The new security object.
        security: Security,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_revs_diff`].
    pub struct PostRevsDiffOptions {
        /// Database name.
        db: String,
        /// Revisions to check, by document ID.
        document_revisions: BTreeMap<String, Vec<String>>,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::get_document_shards_info`].
    pub struct GetDocumentShardsInfoOptions {
        /// Database name.
        db: String,
        /// Document ID.
        doc_id: String,
        ;
    }
}

impl CloudantClient {
    /// Retrieve information about a database.
    pub async fn get_database_information(
        &self,
        options: &DatabaseOptions,
    ) -> Result<DatabaseInformation> {
        let operation = Operation::<Json<DatabaseInformation>>::new(
            "getDatabaseInformation",
            Method::Get,
            "/{db}",
        )
        .path("db", &options.db);
        self.send(operation).await
    }

    /// Check that a database exists.
    pub async fn head_database(&self, options: &DatabaseOptions) -> Result<Response<()>> {
        let operation = Operation::<HeadOnly>::new("headDatabase", Method::Head, "/{db}")
            .path("db", &options.db);
        self.send(operation).await
    }

    /// Create a database.
    pub async fn put_database(&self, options: &PutDatabaseOptions) -> Result<OkResult> {
        let operation = Operation::<Json<OkResult>>::new("putDatabase", Method::Put, "/{db}")
            .path("db", &options.db)
            .query(options);
        self.send(operation).await
    }

    /// Delete a database.
    pub async fn delete_database(&self, options: &DatabaseOptions) -> Result<OkResult> {
        let operation = Operation::<Json<OkResult>>::new("deleteDatabase", Method::Delete, "/{db}")
            .path("db", &options.db);
        self.send(operation).await
    }

    /// Retrieve a database's security object.
    pub async fn get_security(&self, options: &DatabaseOptions) -> Result<Security> {
        let operation = Operation::<Json<Security>>::new(
            "getSecurity",
            Method::Get,
            "/{db}/_security",
        )
        .path("db", &options.db);
        self.send(operation).await
    }

    /// Replace a database's security object.
    pub async fn put_security(&self, options: &PutSecurityOptions) -> Result<OkResult> {
        let operation = Operation::<Json<OkResult>>::new(
            "putSecurity",
            Method::Put,
            "/{db}/_security",
        )
        .path("db", &options.db)
        .json_body(&options.security);
        self.send(operation).await
    }

    /// Find which of the given revisions the database is missing.
    pub async fn post_revs_diff(
        &self,
        options: &PostRevsDiffOptions,
    ) -> Result<BTreeMap<String, RevsDiff>> {
        let operation = Operation::<Json<BTreeMap<String, RevsDiff>>>::new(
            "postRevsDiff",
            Method::Post,
            "/{db}/_revs_diff",
        )
        .path("db", &options.db)
        .require("document_revisions", !options.document_revisions.is_empty())
        .json_body(&options.document_revisions);
        self.send(operation).await
    }

    /// List the shards of a database.
    pub async fn get_shards_information(
        &self,
        options: &DatabaseOptions,
    ) -> Result<ShardsInformation> {
        let operation = Operation::<Json<ShardsInformation>>::new(
            "getShardsInformation",
            Method::Get,
            "/{db}/_shards",
        )
        .path("db", &options.db);
        self.send(operation).await
    }

    /// Find the shard holding a document.
    pub async fn get_document_shards_info(
        &self,
        options: &GetDocumentShardsInfoOptions,
    ) -> Result<DocumentShardInfo> {
        let operation = Operation::<Json<DocumentShardInfo>>::new(
            "getDocumentShardsInfo",
            Method::Get,
            "/{db}/_shards/{doc_id}",
        )
        .path("db", &options.db)
        .path("doc_id", &options.doc_id);
        self.send(operation).await
    }
}
