//! Attachment endpoints.

use bytes::Bytes;
use http::header::{IF_MATCH, IF_NONE_MATCH, RANGE};

use crate::models::DocumentResult;
use crate::{
    Body, CloudantClient, ContentType, HeadOnly, Json, Method, Operation, Query, Response, Result,
    Streamed,
};

const ATTACHMENT_PATH: &str = "/{db}/{doc_id}/{attachment_name}";

options! {
    /// Options of [`CloudantClient::get_attachment`].
    #[derive(Query)]
    pub struct GetAttachmentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
        #[query(skip)]
        doc_id: String,
        /// Attachment name; may contain `/`.
        #[query(skip)]
        attachment_name: String,
        ;
        /// Only return the attachment from this document revision, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// Only return the attachment if the digest differs.
        #[query(skip)]
        if_none_match: String => with_if_none_match,
        /// Byte range, e.g. `bytes=0-99`.
        #[query(skip)]
        range: String => with_range,
        /// Document revision.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::head_attachment`].
    #[derive(Query)]
    pub struct HeadAttachmentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
        #[query(skip)]
        doc_id: String,
        /// Attachment name; may contain `/`.
        #[query(skip)]
        attachment_name: String,
        ;
        /// Only succeed for this document revision, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// Only succeed if the digest differs.
        #[query(skip)]
        if_none_match: String => with_if_none_match,
        /// Document revision.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::put_attachment`].
    #[derive(Query)]
    pub struct PutAttachmentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
        #[query(skip)]
        doc_id: String,
        /// Attachment name; may contain `/`.
        #[query(skip)]
        attachment_name: String,
        /// Attachment content.
        #[query(skip)]
        attachment: Bytes,
        /// Media type of the content.
        #[query(skip)]
        content_type: String,
        ;
        /// Revision of the owning document, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// Revision of the owning document.
        rev: String => with_rev,
    }
}

options! {
    /// Options of [`CloudantClient::delete_attachment`].
    #[derive(Query)]
    pub struct DeleteAttachmentOptions {
        /// Database name.
        #[query(skip)]
        db: String,
        /// Document ID.
        #[query(skip)]
        doc_id: String,
        /// Attachment name; may contain `/`.
        #[query(skip)]
        attachment_name: String,
        ;
        /// Revision of the owning document, as a header.
        #[query(skip)]
        if_match: String => with_if_match,
        /// Revision of the owning document.
        rev: String => with_rev,
        /// Write mode.
        batch: crate::models::Batch => with_batch,
    }
}

impl CloudantClient {
    /// Read an attachment. The body is returned unbuffered.
    pub async fn get_attachment(&self, options: &GetAttachmentOptions) -> Result<Response<Body>> {
        let operation = Operation::<Streamed>::new("getAttachment", Method::Get, ATTACHMENT_PATH)
            .path("db", &options.db)
            .path("doc_id", &options.doc_id)
            .path("attachment_name", &options.attachment_name)
            .header(IF_MATCH, options.if_match.as_deref())
            .header(IF_NONE_MATCH, options.if_none_match.as_deref())
            .header(RANGE, options.range.as_deref())
            .accept(ContentType::Any)
            .query(options);
        self.send(operation).await
    }

    /// Check that an attachment exists. The digest is in [`Response::etag`].
    pub async fn head_attachment(&self, options: &HeadAttachmentOptions) -> Result<Response<()>> {
        let operation = Operation::<HeadOnly>::new("headAttachment", Method::Head, ATTACHMENT_PATH)
            .path("db", &options.db)
            .path("doc_id", &options.doc_id)
            .path("attachment_name", &options.attachment_name)
            .header(IF_MATCH, options.if_match.as_deref())
            .header(IF_NONE_MATCH, options.if_none_match.as_deref())
            .query(options);
        self.send(operation).await
    }

    /// Create or replace an attachment.
    pub async fn put_attachment(&self, options: &PutAttachmentOptions) -> Result<DocumentResult> {
        let operation =
            Operation::<Json<DocumentResult>>::new("putAttachment", Method::Put, ATTACHMENT_PATH)
                .path("db", &options.db)
                .path("doc_id", &options.doc_id)
                .path("attachment_name", &options.attachment_name)
                .require("content_type", !options.content_type.is_empty())
                .header(IF_MATCH, options.if_match.as_deref())
                .query(options)
                .raw_body(options.attachment.clone(), &options.content_type);
        self.send(operation).await
    }

    /// Delete an attachment.
    pub async fn delete_attachment(
        &self,
        options: &DeleteAttachmentOptions,
    ) -> Result<DocumentResult> {
        let operation = Operation::<Json<DocumentResult>>::new(
            "deleteAttachment",
            Method::Delete,
            ATTACHMENT_PATH,
        )
        .path("db", &options.db)
        .path("doc_id", &options.doc_id)
        .path("attachment_name", &options.attachment_name)
        .header(IF_MATCH, options.if_match.as_deref())
        .query(options);
        self.send(operation).await
    }
}
