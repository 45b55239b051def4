//! Design document and view endpoints.

use http::header::{IF_MATCH, IF_NONE_MATCH};
use serde::Serialize;
use serde_json::Value;

use crate::models::{
    AllDocsResult, DesignDocument, DesignDocumentInformation, DocumentResult, ViewQueriesResult,
    ViewQuery, ViewResult, ViewUpdate,
};
use crate::{
    Body, CloudantClient, HeadOnly, Json, Method, Operation, Query, Response, ResponseMode, Result,
    Streamed,
};

options! {
    /// Options of [`CloudantClient::get_design_document`].
    #[derive(Query)]
    pub struct GetDesignDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Design document name, without the `_design/` prefix.
        #[query(skip)]
        ddoc: String,
        ;
        /// Only return the document if its revision differs.
        #[query(skip)]
        if_none_match: String => with_if_none_match,
        /// Include encoding information of attachment stubs.
        att_encoding_info: bool => with_att_encoding_info,
        /// Inline attachment content.
        attachments: bool => with_attachments,
        /// Include conflicting revisions.
        conflicts: bool => with_conflicts,
        /// Include deleted conflicting revisions.
        deleted_conflicts: bool => with_deleted_conflicts,
        /// Return the latest leaf of `rev`.
        latest: bool => with_latest,
        /// Include the last update sequence.
        local_seq: bool => with_local_seq,
        /// Include conflict and revision metadata.
        meta: bool => with_meta,
        /// Revision to read.
        rev: String => with_rev,
        /// Include the revision history.
        revs: bool => with_revs,
        /// Include availability of past revisions.
        revs_info: bool => with_revs_info,
    }
}

options! {
    /// Options of [`CloudantClient::head_design_document`] and
    /// [`CloudantClient::get_design_document_information`].
    pub struct DesignDocumentOptions {
        /// Database name.
        db: String,
        /// Design document name, without the `_design/` prefix.
        ddoc: String,
        ;
        /// Answer `304` if the revision matches.
        if_none_match: String => with_if_none_match,
    }
}

options! {
    /// Options of [`CloudantClient::put_design_document`].
    #[derive(Query)]
    pub struct PutDesignDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Design document name, without the `_design/` prefix.
        #[query(skip)]
        ddoc: String,
        /// The design document.
        #[query(skip)]
        design_document: DesignDocument,
        ;
        /// Revision being replaced, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// `false` to store the revision as given.
        new_edits: bool => with_new_edits,
        /// Revision being replaced.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::delete_design_document`].
    #[derive(Query)]
    pub struct DeleteDesignDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Design document name, without the `_design/` prefix.
        #[query(skip)]
        ddoc: String,
        ;
        /// Revision being deleted, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// Revision being deleted.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::post_design_docs`].
    #[derive(Serialize)]
    pub struct PostDesignDocsOptions {
        /// Database name.
        #[serde(skip)]
        db: String,
        ;
        /// Include encoding information of attachment stubs.
        #[serde(skip_serializing_if = "Option::is_none")]
        att_encoding_info: bool => with_att_encoding_info,
        /// Inline attachment content.
        #[serde(skip_serializing_if = "Option::is_none")]
        attachments: bool => with_attachments,
        /// Include conflict information.
        #[serde(skip_serializing_if = "Option::is_none")]
        conflicts: bool => with_conflicts,
        /// Reverse the order.
        #[serde(skip_serializing_if = "Option::is_none")]
        descending: bool => with_descending,
        /// Include the full design documents.
        #[serde(skip_serializing_if = "Option::is_none")]
        include_docs: bool => with_include_docs,
        /// Include rows matching `end_key`.
        #[serde(skip_serializing_if = "Option::is_none")]
        inclusive_end: bool => with_inclusive_end,
        /// Maximum number of rows.
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: u64 => with_limit,
        /// Rows to skip.
        #[serde(skip_serializing_if = "Option::is_none")]
        skip: u64 => with_skip,
        /// Include the database update sequence.
        #[serde(skip_serializing_if = "Option::is_none")]
        update_seq: bool => with_update_seq,
        /// Stop at this design document ID.
        #[serde(skip_serializing_if = "Option::is_none")]
        end_key: String => with_end_key,
        /// Return only this design document ID.
        #[serde(skip_serializing_if = "Option::is_none")]
        key: String => with_key,
        /// Return only these design document IDs.
        #[serde(skip_serializing_if = "Option::is_none")]
        keys: Vec<String> => with_keys,
        /// Start at this design document ID.
        #[serde(skip_serializing_if = "Option::is_none")]
        start_key: String => with_start_key,
    }
}

options! {
    /// Options of [`CloudantClient::post_view`] and
    /// [`CloudantClient::post_view_as_stream`].
    #[derive(Serialize)]
    pub struct PostViewOptions {
        /// Database name.
        #[serde(skip)]
        db: String,
        /// Design document name, without the `_design/` prefix.
        #[serde(skip)]
        ddoc: String,
        /// View name.
        #[serde(skip)]
        view: String,
        ;
        /// Include encoding information of attachment stubs.
        #[serde(skip_serializing_if = "Option::is_none")]
        att_encoding_info: bool => with_att_encoding_info,
        /// Inline attachment content.
        #[serde(skip_serializing_if = "Option::is_none")]
        attachments: bool => with_attachments,
        /// Include conflict information.
        #[serde(skip_serializing_if = "Option::is_none")]
        conflicts: bool => with_conflicts,
        /// Reverse the order.
        #[serde(skip_serializing_if = "Option::is_none")]
        descending: bool => with_descending,
        /// Include the full documents.
        #[serde(skip_serializing_if = "Option::is_none")]
        include_docs: bool => with_include_docs,
        /// Include rows matching `end_key`.
        #[serde(skip_serializing_if = "Option::is_none")]
        inclusive_end: bool => with_inclusive_end,
        /// Maximum number of rows.
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: u64 => with_limit,
        /// Rows to skip.
        #[serde(skip_serializing_if = "Option::is_none")]
        skip: u64 => with_skip,
        /// Include the database update sequence.
        #[serde(skip_serializing_if = "Option::is_none")]
        update_seq: bool => with_update_seq,
        /// Stop at this key.
        #[serde(skip_serializing_if = "Option::is_none")]
        end_key: Value => with_end_key,
        /// Stop at this document ID within `end_key`.
        #[serde(skip_serializing_if = "Option::is_none")]
        end_key_doc_id: String => with_end_key_doc_id,
        /// Group reduce results by key.
        #[serde(skip_serializing_if = "Option::is_none")]
        group: bool => with_group,
        /// Group array keys by their first elements.
        #[serde(skip_serializing_if = "Option::is_none")]
        group_level: u64 => with_group_level,
        /// Return only this key.
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Value => with_key,
        /// Return only these keys.
        #[serde(skip_serializing_if = "Option::is_none")]
        keys: Vec<Value> => with_keys,
        /// Run the reduce function.
        #[serde(skip_serializing_if = "Option::is_none")]
        reduce: bool => with_reduce,
        /// Prefer a stable shard set.
        #[serde(skip_serializing_if = "Option::is_none")]
        stable: bool => with_stable,
        /// Start at this key.
        #[serde(skip_serializing_if = "Option::is_none")]
        start_key: Value => with_start_key,
        /// Start at this document ID within `start_key`.
        #[serde(skip_serializing_if = "Option::is_none")]
        start_key_doc_id: String => with_start_key_doc_id,
        /// Index freshness.
        #[serde(skip_serializing_if = "Option::is_none")]
        update: ViewUpdate => with_update,
    }
}

options! {
    /// Options of [`CloudantClient::post_view_queries`] and
    /// [`CloudantClient::post_view_queries_as_stream`].
    #[derive(Serialize)]
    pub struct PostViewQueriesOptions {
        /// Database name.
        #[serde(skip)]
        db: String,
        /// Design document name, without the `_design/` prefix.
        #[serde(skip)]
        ddoc: String,
        /// View name.
        #[serde(skip)]
        view: String,
        /// The queries, answered in order.
        queries: Vec<ViewQuery>,
        ;
    }
}

fn post_view<M: ResponseMode>(name: &'static str, options: &PostViewOptions) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_design/{ddoc}/_view/{view}")
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .path("view", &options.view)
        .json_body(options)
}

fn post_view_queries<M: ResponseMode>(
    name: &'static str,
    options: &PostViewQueriesOptions,
) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_design/{ddoc}/_view/{view}/queries")
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .path("view", &options.view)
        .require("queries", !options.queries.is_empty())
        .json_body(options)
}

impl CloudantClient {
    /// Read a design document.
    pub async fn get_design_document(
        &self,
        options: &GetDesignDocumentOptions,
    ) -> Result<DesignDocument> {
        let operation = Operation::<Json<DesignDocument>>::new(
            "getDesignDocument",
            Method::Get,
            "/{db}/_design/{ddoc}",
        )
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .header(IF_NONE_MATCH, options.if_none_match.as_deref())
        .query(options);
        self.send(operation).await
    }

    /// Check that a design document exists.
    pub async fn head_design_document(
        &self,
        options: &DesignDocumentOptions,
    ) -> Result<Response<()>> {
        let operation =
            Operation::<HeadOnly>::new("headDesignDocument", Method::Head, "/{db}/_design/{ddoc}")
                .path("db", &options.db)
                .path("ddoc", &options.ddoc)
                .header(IF_NONE_MATCH, options.if_none_match.as_deref());
        self.send(operation).await
    }

    /// Create or replace a design document.
    pub async fn put_design_document(
        &self,
        options: &PutDesignDocumentOptions,
    ) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "putDesignDocument",
            Method::Put,
            "/{db}/_design/{ddoc}",
        )
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .header(IF_MATCH, options.if_match.as_deref())
        .query(options)
        .json_body(&options.design_document);
        self.send(operation).await
    }

    /// Delete a design document.
    pub async fn delete_design_document(
        &self,
        options: &DeleteDesignDocumentOptions,
    ) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "deleteDesignDocument",
            Method::Delete,
            "/{db}/_design/{ddoc}",
        )
        .path("db", &options.db)
        .path("ddoc", &options.ddoc)
        .header(IF_MATCH, options.if_match.as_deref())
        .query(options);
        self.send(operation).await
    }

    /// Retrieve the view index state of a design document.
    pub async fn get_design_document_information(
        &self,
        options: &DesignDocumentOptions,
    ) -> Result<DesignDocumentInformation> {
        let operation = Operation::<Json<DesignDocumentInformation>>::new(
            "getDesignDocumentInformation",
            Method::Get,
            "/{db}/_design/{ddoc}/_info",
        )
        .path("db", &options.db)
        .path("ddoc", &options.ddoc);
        self.send(operation).await
    }

    /// List design documents.
    pub async fn post_design_docs(&self, options: &PostDesignDocsOptions) -> Result<AllDocsResult> {
        let operation = Operation::<Json<AllDocsResult>>::new(
            "postDesignDocs",
            Method::Post,
            "/{db}/_design_docs",
        )
        .path("db", &options.db)
        .json_body(options);
        self.send(operation).await
    }

    /// Query a view.
    pub async fn post_view(&self, options: &PostViewOptions) -> Result<ViewResult> {
        self.send(post_view::<Json<ViewResult>>("postView", options))
            .await
    }

    /// Query a view, returning an unbuffered body.
    pub async fn post_view_as_stream(&self, options: &PostViewOptions) -> Result<Response<Body>> {
        self.send(post_view::<Streamed>("postViewAsStream", options))
            .await
    }

    /// Run several queries against one view.
    pub async fn post_view_queries(
        &self,
        options: &PostViewQueriesOptions,
    ) -> Result<ViewQueriesResult> {
        self.send(post_view_queries::<Json<ViewQueriesResult>>("postViewQueries", options))
            .await
    }

    /// Run several queries against one view, returning an unbuffered body.
    pub async fn post_view_queries_as_stream(
        &self,
        options: &PostViewQueriesOptions,
    ) -> Result<Response<Body>> {
        self.send(post_view_queries::<Streamed>("postViewQueriesAsStream", options))
            .await
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;

    #[test]
    fn view_keys_are_json_values() {
        let options = PostViewOptions::new("orders", "reports", "by_customer")
            .with_keys(vec![json!(["acme", 2024]), json!(["globex", 2024])])
            .with_group(true);

        check!(
            serde_json::to_value(&options).expect("encode")
                == json!({"group": true, "keys": [["acme", 2024], ["globex", 2024]]})
        );
    }

    #[test]
    fn unknown_update_mode_is_not_sent() {
        let options = PostViewOptions::new("db", "ddoc", "view").with_update(ViewUpdate::from("eager"));
        check!(serde_json::to_value(&options).is_err());
    }
}
