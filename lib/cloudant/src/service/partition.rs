//! Partitioned database endpoints.
//!
//! Each partitioned query pairs a partition key with the options record of
//! its global counterpart. Parameters the service only accepts globally, such
//! as search facets, are rejected by the server.

use crate::models::{AllDocsResult, FindResult, PartitionInformation, SearchResult, ViewResult};
use crate::service::{PostAllDocsOptions, PostFindOptions, PostSearchOptions, PostViewOptions};
use crate::{
    Body, CloudantClient, Json, Method, Operation, Response, ResponseMode, Result, Streamed,
};

options! {
    /// Options of [`CloudantClient::get_partition_information`].
    pub struct GetPartitionInformationOptions {
        /// Database name.
        db: String,
        /// Partition key.
        partition_key: String,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_partition_all_docs`] and
    /// [`CloudantClient::post_partition_all_docs_as_stream`].
    pub struct PostPartitionAllDocsOptions {
        /// Partition key.
        partition_key: String,
        /// The query; its `db` names the database.
        all_docs: PostAllDocsOptions,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_partition_find`] and
    /// [`CloudantClient::post_partition_find_as_stream`].
    pub struct PostPartitionFindOptions {
        /// Partition key.
        partition_key: String,
        /// The query; its `db` names the database.
        find: PostFindOptions,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_partition_view`] and
    /// [`CloudantClient::post_partition_view_as_stream`].
    pub struct PostPartitionViewOptions {
        /// Partition key.
        partition_key: String,
        /// The query; its `db` names the database.
        view: PostViewOptions,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_partition_search`].
    pub struct PostPartitionSearchOptions {
        /// Partition key.
        partition_key: String,
        /// The query; its `db` names the database.
        search: PostSearchOptions,
        ;
    }
}

fn post_partition_all_docs<M: ResponseMode>(
    name: &'static str,
    options: &PostPartitionAllDocsOptions,
) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_partition/{partition_key}/_all_docs")
        .path("db", &options.all_docs.db)
        .path("partition_key", &options.partition_key)
        .json_body(&options.all_docs)
}

fn post_partition_find<M: ResponseMode>(
    name: &'static str,
    options: &PostPartitionFindOptions,
) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_partition/{partition_key}/_find")
        .path("db", &options.find.db)
        .path("partition_key", &options.partition_key)
        .json_body(&options.find)
}

fn post_partition_view<M: ResponseMode>(
    name: &'static str,
    options: &PostPartitionViewOptions,
) -> Operation<M> {
    Operation::new(
        name,
        Method::Post,
        "/{db}/_partition/{partition_key}/_design/{ddoc}/_view/{view}",
    )
    .path("db", &options.view.db)
    .path("partition_key", &options.partition_key)
    .path("ddoc", &options.view.ddoc)
    .path("view", &options.view.view)
    .json_body(&options.view)
}

impl CloudantClient {
    /// Retrieve information about a partition.
    pub async fn get_partition_information(
        &self,
        options: &GetPartitionInformationOptions,
    ) -> Result<PartitionInformation> {
        let operation = Operation::<Json<PartitionInformation>>::new(
            "getPartitionInformation",
            Method::Get,
            "/{db}/_partition/{partition_key}",
        )
        .path("db", &options.db)
        .path("partition_key", &options.partition_key);
        self.send(operation).await
    }

    /// List the documents of a partition.
    pub async fn post_partition_all_docs(
        &self,
        options: &PostPartitionAllDocsOptions,
    ) -> Result<AllDocsResult> {
        self.send(post_partition_all_docs::<Json<AllDocsResult>>(
            "postPartitionAllDocs",
            options,
        ))
        .await
    }

    /// List the documents of a partition, returning an unbuffered body.
    pub async fn post_partition_all_docs_as_stream(
        &self,
        options: &PostPartitionAllDocsOptions,
    ) -> Result<Response<Body>> {
        self.send(post_partition_all_docs::<Streamed>(
            "postPartitionAllDocsAsStream",
            options,
        ))
        .await
    }

    /// Find documents of a partition matching a selector.
    pub async fn post_partition_find(
        &self,
        options: &PostPartitionFindOptions,
    ) -> Result<FindResult> {
        self.send(post_partition_find::<Json<FindResult>>("postPartitionFind", options))
            .await
    }

    /// Find documents of a partition, returning an unbuffered body.
    pub async fn post_partition_find_as_stream(
        &self,
        options: &PostPartitionFindOptions,
    ) -> Result<Response<Body>> {
        self.send(post_partition_find::<Streamed>("postPartitionFindAsStream", options))
            .await
    }

    /// Query a view within a partition.
    pub async fn post_partition_view(
        &self,
        options: &PostPartitionViewOptions,
    ) -> Result<ViewResult> {
        self.send(post_partition_view::<Json<ViewResult>>("postPartitionView", options))
            .await
    }

    /// Query a view within a partition, returning an unbuffered body.
    pub async fn post_partition_view_as_stream(
        &self,
        options: &PostPartitionViewOptions,
    ) -> Result<Response<Body>> {
        self.send(post_partition_view::<Streamed>("postPartitionViewAsStream", options))
            .await
    }

    /// Query a search index within a partition.
    pub async fn post_partition_search(
        &self,
        options: &PostPartitionSearchOptions,
    ) -> Result<SearchResult> {
        let search = &options.search;
        let operation = Operation::<Json<SearchResult>>::new(
            "postPartitionSearch",
            Method::Post,
            "/{db}/_partition/{partition_key}/_design/{ddoc}/_search/{index}",
        )
        .path("db", &search.db)
        .path("partition_key", &options.partition_key)
        .path("ddoc", &search.ddoc)
        .path("index", &search.index)
        .require("query", !search.query.is_empty())
        .json_body(search);
        self.send(operation).await
    }
}
