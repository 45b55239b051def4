//! Document endpoints.

use http::header::{IF_MATCH, IF_NONE_MATCH};
use serde::Serialize;

use crate::models::{
    AllDocsQueriesResult, AllDocsQuery, AllDocsResult, Batch, BulkDocs, BulkGetQueryDocument,
    BulkGetResult, Document, DocumentResult,
};
use crate::{
    Body, ByteStream, CloudantClient, ContentType, HeadOnly, Json, Method, Operation, Query,
    Response, ResponseMode, Result, Streamed,
};

options! {
    /// Options of [`CloudantClient::post_document`].
    #[derive(Query)]
    pub struct PostDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// The document; the server assigns an ID when it has none.
        #[query(skip)]
        document: Document,
        ;
        /// Write mode.
        batch: Batch => with_batch,
    }
}

options! {
    /// Options of [`CloudantClient::get_document`] and its streamed and
    /// multipart variants.
    #[derive(Query)]
    pub struct GetDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
        #[query(skip)]
        doc_id: String,
        ;
        /// Only return the document if its revision differs.
        #[query(skip)]
        if_none_match: String => with_if_none_match,
        /// Include encoding information of attachment stubs.
        att_encoding_info: bool => with_att_encoding_info,
        /// Inline attachment content.
        attachments: bool => with_attachments,
        /// Only inline attachments changed after these revisions.
        #[query(format = "json")]
        atts_since: Vec<String> => with_atts_since,
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
        /// Read these leaf revisions, or `["all"]`.
        #[query(format = "json")]
        open_revs: Vec<String> => with_open_revs,
        /// Revision to read.
        rev: String => with_rev,
        /// Include the revision history.
        revs: bool => with_revs,
        /// Include availability of past revisions.
        revs_info: bool => with_revs_info,
    }
}

options! {
    /// Options of [`CloudantClient::head_document`].
    #[derive(Query)]
    pub struct HeadDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
        #[query(skip)]
        doc_id: String,
        ;
        /// Answer `304` if the revision matches.
        #[query(skip)]
        if_none_match: String => with_if_none_match,
        /// Check the latest leaf of `rev`.
        latest: bool => with_latest,
        /// Revision to check.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::put_document`].
    #[derive(Query)]
    pub struct PutDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
        #[query(skip)]
        doc_id: String,
        /// The document.
        #[query(skip)]
        document: Document,
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
    /// Options of [`CloudantClient::delete_document`].
    #[derive(Query)]
    pub struct DeleteDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
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
    /// Options of [`CloudantClient::get_local_document`].
    #[derive(Query)]
    pub struct GetLocalDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Local document ID, without the `_local/` prefix.
        #[query(skip)]
        doc_id: String,
        ;
        /// Only return the document if its revision differs.
        #[query(skip)]
        if_none_match: String => with_if_none_match,
        /// Include encoding information of attachment stubs.
        att_encoding_info: bool => with_att_encoding_info,
        /// Inline attachment content.
        attachments: bool => with_attachments,
        /// Include the last update sequence.
        local_seq: bool => with_local_seq,
    }
}

options! {
    /// Options of [`CloudantClient::put_local_document`].
    #[derive(Query)]
    pub struct PutLocalDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Local document ID, without the `_local/` prefix.
        #[query(skip)]
        doc_id: String,
        /// The document.
        #[query(skip)]
        document: Document,
        ;
        /// Write mode.
        batch: Batch => with_batch,
    }
}

options! {
    /// Options of [`CloudantClient::delete_local_document`].
    #[derive(Query)]
    pub struct DeleteLocalDocumentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Local document ID, without the `_local/` prefix.
        #[query(skip)]
        doc_id: String,
        ;
        /// Write mode.
        batch: Batch => with_batch,
    }
}

options! {
    /// Options of [`CloudantClient::post_all_docs`] and
    /// [`CloudantClient::post_all_docs_as_stream`].
    #[derive(Serialize)]
    pub struct PostAllDocsOptions {
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
        /// Stop at this document ID.
        #[serde(skip_serializing_if = "Option::is_none")]
        end_key: String => with_end_key,
        /// Return only this document ID.
        #[serde(skip_serializing_if = "Option::is_none")]
        key: String => with_key,
        /// Return only these document IDs.
        #[serde(skip_serializing_if = "Option::is_none")]
        keys: Vec<String> => with_keys,
        /// Start at this document ID.
        #[serde(skip_serializing_if = "Option::is_none")]
        start_key: String => with_start_key,
    }
}

options! {
    /// Options of [`CloudantClient::post_all_docs_queries`].
    #[derive(Serialize)]
    pub struct PostAllDocsQueriesOptions {
        /// Database name.
        #[serde(skip)]
        db: String,
        /// The queries, answered in order.
        queries: Vec<AllDocsQuery>,
        ;
    }
}

options! {
    /// Options of [`CloudantClient::post_bulk_docs`].
    pub struct PostBulkDocsOptions {
        /// Database name.
        db: String,
        /// Documents to write.
        bulk_docs: BulkDocs,
        ;
    }
}

/// Options of [`CloudantClient::post_bulk_docs_stream`].
///
/// The body is pre-serialized `_bulk_docs` JSON supplied as a byte stream.
/// It is sent as-is (gzip-compressed unless disabled) and, unless the client
/// has a spool limit, cannot be retried.
pub struct PostBulkDocsStreamOptions {
    /// Database name.
    pub db: String,
    /// The request body.
    pub body: ByteStream,
}

impl PostBulkDocsStreamOptions {
    /// Create the record from its required inputs.
    #[must_use]
    pub fn new(db: impl Into<String>, body: ByteStream) -> Self {
        Self { db: db.into(), body }
    }
}

impl std::fmt::Debug for PostBulkDocsStreamOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostBulkDocsStreamOptions")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

options! {
    /// Options of [`CloudantClient::post_bulk_get`] and its streamed and
    /// multipart variants.
    #[derive(Query, Serialize)]
    pub struct PostBulkGetOptions {
        /// Database name.
        #[query(skip)]
        #[serde(skip)]
        db: String,
        /// Documents to read.
        #[query(skip)]
        docs: Vec<BulkGetQueryDocument>,
        ;
        /// Include encoding information of attachment stubs.
        #[serde(skip)]
        att_encoding_info: bool => with_att_encoding_info,
        /// Inline attachment content.
        #[serde(skip)]
        attachments: bool => with_attachments,
        /// Return the latest leaf of each requested revision.
        #[serde(skip)]
        latest: bool => with_latest,
        /// Include the revision history.
        #[serde(skip)]
        revs: bool => with_revs,
    }
}

fn get_document<M: ResponseMode>(name: &'static str, options: &GetDocumentOptions) -> Operation<M> {
    Operation::new(name, Method::Get, "/{db}/{doc_id}")
        .path("db", &options.db)
        .path("doc_id", &options.doc_id)
        .header(IF_NONE_MATCH, options.if_none_match.as_deref())
        .query(options)
}

fn post_all_docs<M: ResponseMode>(
    name: &'static str,
    options: &PostAllDocsOptions,
) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_all_docs")
        .path("db", &options.db)
        .json_body(options)
}

fn post_bulk_get<M: ResponseMode>(
    name: &'static str,
    options: &PostBulkGetOptions,
) -> Operation<M> {
    Operation::new(name, Method::Post, "/{db}/_bulk_get")
        .path("db", &options.db)
        .require("docs", !options.docs.is_empty())
        .query(options)
        .json_body(options)
}

impl CloudantClient {
    /// Create a document with a server-assigned or embedded ID.
    pub async fn post_document(&self, options: &PostDocumentOptions) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "postDocument",
            Method::Post,
            "/{db}",
        )
        .path("db", &options.db)
        .query(options)
        .json_body(&options.document);
        self.send(operation).await
    }

    /// Read a document.
    pub async fn get_document(&self, options: &GetDocumentOptions) -> Result<Document> {
        self.send(get_document::<Json<Document>>("getDocument", options))
            .await
    }

    /// Read a document as an unbuffered body.
    pub async fn get_document_as_stream(
        &self,
        options: &GetDocumentOptions,
    ) -> Result<Response<Body>> {
        self.send(get_document::<Streamed>("getDocumentAsStream", options))
            .await
    }

    /// Read a document and its attachments as a `multipart/mixed` body.
    pub async fn get_document_as_mixed(
        &self,
        options: &GetDocumentOptions,
    ) -> Result<Response<Body>> {
        let operation = get_document::<Streamed>("getDocumentAsMixed", options)
            .accept(ContentType::MultipartMixed);
        self.send(operation).await
    }

    /// Read a document and its attachments as a `multipart/related` body.
    pub async fn get_document_as_related(
        &self,
        options: &GetDocumentOptions,
    ) -> Result<Response<Body>> {
        let operation = get_document::<Streamed>("getDocumentAsRelated", options)
            .accept(ContentType::MultipartRelated);
        self.send(operation).await
    }

    /// Check that a document exists. The revision is in [`Response::etag`].
    pub async fn head_document(&self, options: &HeadDocumentOptions) -> Result<Response<()>> {
        let operation = Operation::<HeadOnly>::new("headDocument", Method::Head, "/{db}/{doc_id}")
            .path("db", &options.db)
            .path("doc_id", &options.doc_id)
            .header(IF_NONE_MATCH, options.if_none_match.as_deref())
            .query(options);
        self.send(operation).await
    }

    /// Create or replace a document.
    pub async fn put_document(&self, options: &PutDocumentOptions) -> Result<DocumentResult> {
        let operation =
            Operation::<Json<DocumentResult>>::new("putDocument", Method::Put, "/{db}/{doc_id}")
                .path("db", &options.db)
                .path("doc_id", &options.doc_id)
                .header(IF_MATCH, options.if_match.as_deref())
                .query(options)
                .json_body(&options.document);
        self.send(operation).await
    }

    /// Delete a document.
    pub async fn delete_document(&self, options: &DeleteDocumentOptions) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "deleteDocument",
            Method::Delete,
            "/{db}/{doc_id}",
        )
        .path("db", &options.db)
        .path("doc_id", &options.doc_id)
        .header(IF_MATCH, options.if_match.as_deref())
        .query(options);
        self.send(operation).await
    }

    /// Read a local (non-replicated) document.
    pub async fn get_local_document(&self, options: &GetLocalDocumentOptions) -> Result<Document> {
        let operation = Operation::<Json<Document>>::new(
            "getLocalDocument",
            Method::Get,
            "/{db}/_local/{doc_id}",
        )
        .path("db", &options.db)
        .path("doc_id", &options.doc_id)
        .header(IF_NONE_MATCH, options.if_none_match.as_deref())
        .query(options);
        self.send(operation).await
    }

    /// Create or replace a local document.
    pub async fn put_local_document(
        &self,
        options: &PutLocalDocumentOptions,
    ) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "putLocalDocument",
            Method::Put,
            "/{db}/_local/{doc_id}",
        )
        .path("db", &options.db)
        .path("doc_id", &options.doc_id)
        .query(options)
        .json_body(&options.document);
        self.send(operation).await
    }

    /// Delete a local document.
    pub async fn delete_local_document(
        &self,
        options: &DeleteLocalDocumentOptions,
    ) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "deleteLocalDocument",
            Method::Delete,
            "/{db}/_local/{doc_id}",
        )
        .path("db", &options.db)
        .path("doc_id", &options.doc_id)
        .query(options);
        self.send(operation).await
    }

    /// List documents by ID.
    pub async fn post_all_docs(&self, options: &PostAllDocsOptions) -> Result<AllDocsResult> {
        self.send(post_all_docs::<Json<AllDocsResult>>("postAllDocs", options))
            .await
    }

    /// List documents by ID as an unbuffered body.
    pub async fn post_all_docs_as_stream(
        &self,
        options: &PostAllDocsOptions,
    ) -> Result<Response<Body>> {
        self.send(post_all_docs::<Streamed>("postAllDocsAsStream", options))
            .await
    }

    /// Run several `_all_docs` queries in one request.
    pub async fn post_all_docs_queries(
        &self,
        options: &PostAllDocsQueriesOptions,
    ) -> Result<AllDocsQueriesResult> {
        let operation = Operation::<Json<AllDocsQueriesResult>>::new(
            "postAllDocsQueries",
            Method::Post,
            "/{db}/_all_docs/queries",
        )
        .path("db", &options.db)
        .require("queries", !options.queries.is_empty())
        .json_body(options);
        self.send(operation).await
    }

    /// Create, update or delete several documents in one request.
    pub async fn post_bulk_docs(
        &self,
        options: &PostBulkDocsOptions,
    ) -> Result<Vec<DocumentResult>> {
        let operation = Operation::<Json<Vec<DocumentResult>>>::new(
            "postBulkDocs",
            Method::Post,
            "/{db}/_bulk_docs",
        )
        .path("db", &options.db)
        .json_body(&options.bulk_docs);
        self.send(operation).await
    }

    /// Upload pre-serialized `_bulk_docs` JSON from a byte stream.
    pub async fn post_bulk_docs_stream(
        &self,
        options: PostBulkDocsStreamOptions,
    ) -> Result<Vec<DocumentResult>> {
        let operation = Operation::<Json<Vec<DocumentResult>>>::new(
            "postBulkDocsStream",
            Method::Post,
            "/{db}/_bulk_docs",
        )
        .path("db", options.db)
        .stream_body(options.body);
        self.send(operation).await
    }

    /// Read several documents in one request.
    pub async fn post_bulk_get(&self, options: &PostBulkGetOptions) -> Result<BulkGetResult> {
        self.send(post_bulk_get::<Json<BulkGetResult>>("postBulkGet", options))
            .await
    }

    /// Read several documents as a `multipart/mixed` body.
    pub async fn post_bulk_get_as_mixed(
        &self,
        options: &PostBulkGetOptions,
    ) -> Result<Response<Body>> {
        let operation = post_bulk_get::<Streamed>("postBulkGetAsMixed", options)
            .accept(ContentType::MultipartMixed);
        self.send(operation).await
    }

    /// Read several documents as a `multipart/related` body.
    pub async fn post_bulk_get_as_related(
        &self,
        options: &PostBulkGetOptions,
    ) -> Result<Response<Body>> {
        let operation = post_bulk_get::<Streamed>("postBulkGetAsRelated", options)
            .accept(ContentType::MultipartRelated);
        self.send(operation).await
    }

    /// Read several documents as an unbuffered JSON body.
    pub async fn post_bulk_get_as_stream(
        &self,
        options: &PostBulkGetOptions,
    ) -> Result<Response<Body>> {
        self.send(post_bulk_get::<Streamed>("postBulkGetAsStream", options))
            .await
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;
    use crate::ToQueryPairs;

    #[test]
    fn header_inputs_stay_out_of_the_query() {
        let options = GetDocumentOptions::new("orders", "order-1")
            .with_if_none_match("1-abc")
            .with_revs(true)
            .with_open_revs(vec!["all".to_string()]);

        let pairs = options.to_query_pairs().expect("pairs");

        check!(
            pairs
                == vec![
                    ("open_revs".to_string(), r#"["all"]"#.to_string()),
                    ("revs".to_string(), "true".to_string()),
                ]
        );
    }

    #[test]
    fn all_docs_options_become_the_body() {
        let options = PostAllDocsOptions::new("orders")
            .with_include_docs(true)
            .with_limit(10_u64)
            .with_start_key("order-");

        check!(
            serde_json::to_value(&options).expect("encode")
                == json!({"include_docs": true, "limit": 10, "start_key": "order-"})
        );
    }

    #[test]
    fn bulk_get_splits_query_and_body() {
        let options = PostBulkGetOptions::new("orders", vec![BulkGetQueryDocument::new("a")])
            .with_revs(true);

        check!(options.to_query_pairs().expect("pairs") == vec![("revs".to_string(), "true".to_string())]);
        check!(serde_json::to_value(&options).expect("encode") == json!({"docs": [{"id": "a"}]}));
    }
}
