//! Mango query and index endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::models::{
    ExplainResult, FindResult, IndexDefinition, IndexResult, IndexType, IndexesInformation,
    OkResult,
};
use crate::{
    Body, CloudantClient, Json, Method, Operation, Response, ResponseMode, Result, Streamed,
};

options! {
    /// Options of [`CloudantClient::post_find`], [`CloudantClient::post_find_as_stream`]
    /// and [`CloudantClient::post_explain`].
    #[derive(Serialize)]
    pub struct PostFindOptions {
        /// Database name.
        #[serde(skip)]
        db: String,
        /// Documents to match.
        selector: Value,
        ;
        /// Resume after this page.
        #[serde(skip_serializing_if = "Option::is_none")]
        bookmark: String => with_bookmark,
        /// Include conflict information.
        #[serde(skip_serializing_if = "Option::is_none")]
        conflicts: bool => with_conflicts,
        /// Include execution statistics.
        #[serde(skip_serializing_if = "Option::is_none")]
        execution_stats: bool => with_execution_stats,
        /// Fields to return.
        #[serde(skip_serializing_if = "Option::is_none")]
        fields: Vec<String> => with_fields,
        /// Maximum number of documents.
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: u64 => with_limit,
        /// Documents to skip.
        #[serde(skip_serializing_if = "Option::is_none")]
        skip: u64 => with_skip,
        /// Sort order, e.g. `[{"total": "desc"}]`.
        #[serde(skip_serializing_if = "Option::is_none")]
        sort: Vec<Value> => with_sort,
        /// Prefer a stable shard set.
        #[serde(skip_serializing_if = "Option::is_none")]
        stable: bool => with_stable,
        /// Update the index before answering.
        #[serde(skip_serializing_if = "Option::is_none")]
        update: String => with_update,
        /// Index to use, as `ddoc` or `[ddoc, name]`.
        #[serde(skip_serializing_if = "Option::is_none")]
        use_index: Vec<String> => with_use_index,
        /// Read quorum.
        #[serde(skip_serializing_if = "Option::is_none")]
        r: u64 => with_r,
    }
}

options! {
    /// Options naming a database, for [`CloudantClient::get_indexes_information`].
    pub struct GetIndexesInformationOptions {
        /// Database name.
        db: String,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_index`].
    #[derive(Serialize)]
    pub struct PostIndexOptions {
        /// Database name.
        #[serde(skip)]
        db: String,
        /// What the index covers.
        index: IndexDefinition,
        ;
        /// Design document to hold the index.
        #[serde(skip_serializing_if = "Option::is_none")]
        ddoc: String => with_ddoc,
        /// Index name.
        #[serde(skip_serializing_if = "Option::is_none")]
        name: String => with_name,
        /// Create a partitioned index.
        #[serde(skip_serializing_if = "Option::is_none")]
        partitioned: bool => with_partitioned,
        /// Index kind, `type` on the wire.
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        index_type: IndexType => with_index_type,
    }
}

options! {
    /// Options of [`CloudantClient::delete_index`].
    pub struct DeleteIndexOptions {
        /// Database name.
        db: String,
        /// Design document name, without the `_design/` prefix.
        ddoc: String,
        /// Index kind, e.g. `json` or `text`.
        index_type: IndexType,
        /// Index name.
        index: String,
        ;
    }
}

fn post_find<M: ResponseMode>(name: &'static str, options: &PostFindOptions) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_find")
        .path("db", &options.db)
        .json_body(options)
}

impl CloudantClient {
    /// Find documents matching a selector.
    pub async fn post_find(&self, options: &PostFindOptions) -> Result<FindResult> {
        self.send(post_find::<Json<FindResult>>("postFind", options))
            .await
    }

    /// Find documents matching a selector, returning an unbuffered body.
    pub async fn post_find_as_stream(&self, options: &PostFindOptions) -> Result<Response<Body>> {
        self.send(post_find::<Streamed>("postFindAsStream", options))
            .await
    }

    /// Describe how a query would be executed.
    pub async fn post_explain(&self, options: &PostFindOptions) -> Result<ExplainResult> {
        let operation = Operation::<Json<ExplainResult>>::new(
            "postExplain",
            Method::Post,
            "/{db}/_explain",
        )
        .path("db", &options.db)
        .json_body(options);
        self.send(operation).await
    }

    /// List the query indexes of a database.
    pub async fn get_indexes_information(
        &self,
        options: &GetIndexesInformationOptions,
    ) -> Result<IndexesInformation> {
        let operation = Operation::<Json<IndexesInformation>>::new(
            "getIndexesInformation",
            Method::Get,
            "/{db}/_index",
        )
        .path("db", &options.db);
        self.send(operation).await
    }

    /// Create a query index.
    pub async fn post_index(&self, options: &PostIndexOptions) -> Result<IndexResult> {
        let operation = Operation::<Json<IndexResult>>::new(
            "postIndex",
            Method::Post,
            "/{db}/_index",
        )
        .path("db", &options.db)
        .json_body(options);
        self.send(operation).await
    }

    /// Delete a query index.
    pub async fn delete_index(&self, options: &DeleteIndexOptions) -> Result<OkResult> {
        let operation = Operation::<Json<OkResult>>::new(
            "deleteIndex",
            Method::Delete,
            "/{db}/_index/_design/{ddoc}/{type}/{index}",
        )
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .path("type", options.index_type.as_str())
        .path("index", &options.index);
        self.send(operation).await
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;

    #[test]
    fn index_type_keeps_wire_name() {
        let mut definition = IndexDefinition::default();
        definition
            .fields
            .push([("total".to_string(), "asc".to_string())].into_iter().collect());
        let options = PostIndexOptions::new("orders", definition)
            .with_name("by-total")
            .with_index_type(IndexType::Json);

        check!(
            serde_json::to_value(&options).expect("encode")
                == json!({"index": {"fields": [{"total": "asc"}]}, "name": "by-total", "type": "json"})
        );
    }
}
