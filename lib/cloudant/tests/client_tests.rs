//! End-to-end tests of the service catalog against a mock server.

use std::io::{Read, Write};
use std::time::Duration;

use assert2::{check, let_assert};
use bytes::Bytes;
use cloudant::header::HeaderMap;
use cloudant::{
    Body, BulkGetQueryDocument, CloudantClient, ContentType, Document, Error, ErrorKind,
    GetDocumentOptions, HeadDocumentOptions, HttpClient, OpenRecord, PostBulkDocsStreamOptions,
    PostBulkGetOptions, PostChangesOptions, PutAttachmentOptions, PutDatabaseOptions,
    PutDocumentOptions, Request, Response,
};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn client(server: &MockServer) -> CloudantClient {
    CloudantClient::builder()
        .base_url(server.uri())
        .gzip_requests(false)
        .backoff(Duration::from_millis(1), Duration::from_millis(10))
        .build()
        .expect("client")
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("compress");
    encoder.finish().expect("finish")
}

#[tokio::test]
async fn reads_server_information() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "couchdb": "Welcome",
            "features": ["access-ready", "partitioned"],
            "vendor": {"name": "IBM Cloudant", "variant": "paas", "version": "8.4.0"},
            "version": "3.3.3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client(&server)
        .get_server_information()
        .await
        .expect("server information");

    check!(info.couchdb == "Welcome");
    check!(info.features == vec!["access-ready", "partitioned"]);
    check!(info.vendor.name == "IBM Cloudant");
    check!(info.vendor.variant.as_deref() == Some("paas"));
}

/// Answers every call from memory. Not `Clone`.
struct CannedServer {
    body: &'static str,
}

impl HttpClient for CannedServer {
    async fn execute(&self, _request: Request) -> cloudant::Result<Response<Body>> {
        Ok(Response::new(
            200,
            HeaderMap::new(),
            Body::from_bytes(Bytes::from_static(self.body.as_bytes())),
        ))
    }
}

#[tokio::test]
async fn custom_http_client_replaces_the_transport() {
    let client = CloudantClient::builder()
        .base_url("http://localhost:5984")
        .http_client(CannedServer {
            body: r#"{"couchdb": "Welcome", "vendor": {"name": "Apache"}, "version": "3.4.2"}"#,
        })
        .build()
        .expect("client");

    let info = client.get_server_information().await.expect("server information");

    check!(info.vendor.name == "Apache");
    check!(info.version == "3.4.2");
}

#[tokio::test]
async fn document_round_trip_keeps_user_properties() {
    let server = MockServer::start().await;
    let stored = json!({
        "_id": "doc1",
        "userId": "abc123",
        "eventType": "addedToBasket"
    });
    Mock::given(method("PUT"))
        .and(path("/events/doc1"))
        .and(header("content-type", "application/json"))
        .and(body_json(&stored))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "doc1", "ok": true, "rev": "1-abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events/doc1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&stored))
        .mount(&server)
        .await;

    let client = client(&server);
    let document = Document::with_id("doc1")
        .with_property("userId", "abc123")
        .and_then(|document| document.with_property("eventType", "addedToBasket"))
        .expect("properties");
    let written = client
        .put_document(&PutDocumentOptions::new("events", "doc1", document))
        .await
        .expect("put");
    check!(written.rev.as_deref() == Some("1-abc"));

    let read = client
        .get_document(&GetDocumentOptions::new("events", "doc1"))
        .await
        .expect("get");
    check!(read.id.as_deref() == Some("doc1"));
    check!(
        serde_json::Value::Object(read.properties().clone())
            == json!({"userId": "abc123", "eventType": "addedToBasket"})
    );
}

#[tokio::test]
async fn request_body_is_gzipped_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/orders/order-1"))
        .and(header("content-encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "order-1", "ok": true, "rev": "1-abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CloudantClient::builder()
        .base_url(server.uri())
        .build()
        .expect("client");
    let document = Document::with_id("order-1")
        .with_property("total", 42)
        .expect("property");
    client
        .put_document(&PutDocumentOptions::new("orders", "order-1", document))
        .await
        .expect("put");

    let requests = server.received_requests().await.expect("recorded");
    let_assert!([request] = requests.as_slice());
    let mut decoded = String::new();
    GzDecoder::new(request.body.as_slice())
        .read_to_string(&mut decoded)
        .expect("gunzip");
    let body: serde_json::Value = serde_json::from_str(&decoded).expect("json");
    check!(body == json!({"_id": "order-1", "total": 42}));
}

#[tokio::test]
async fn gzipped_response_is_decoded() {
    let server = MockServer::start().await;
    let body = gzip(br#"{"_id": "order-1", "_rev": "2-def"}"#);
    Mock::given(method("GET"))
        .and(path("/orders/order-1"))
        .and(header("accept-encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_raw(body, "application/json"),
        )
        .mount(&server)
        .await;

    let document = client(&server)
        .get_document(&GetDocumentOptions::new("orders", "order-1"))
        .await
        .expect("get");

    check!(document.rev.as_deref() == Some("2-def"));
}

#[tokio::test]
async fn missing_input_fails_without_a_request() {
    let server = MockServer::start().await;

    let error = client(&server)
        .put_database(&PutDatabaseOptions::new(""))
        .await
        .expect_err("empty database name");

    check!(error.kind() == ErrorKind::InvalidArgument);
    check!(error.operation() == Some("putDatabase"));
    let_assert!(Error::InvalidArgument(name) = error.root());
    check!(name == "db");
    let requests = server.received_requests().await.expect("recorded");
    check!(requests.is_empty());
}

#[tokio::test]
async fn server_error_document_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": "not_found", "reason": "missing"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let error = client(&server)
        .get_document(&GetDocumentOptions::new("orders", "missing"))
        .await
        .expect_err("missing document");

    check!(error.kind() == ErrorKind::ClientError);
    check!(error.status() == Some(404));
    let_assert!(Some(server_error) = error.server_error());
    check!(server_error.error == "not_found");
    check!(server_error.reason == "missing");
    insta::assert_snapshot!(
        error.to_string(),
        @"getDocument failed: HTTP error 404: not_found: missing"
    );
}

#[tokio::test]
async fn streamed_bulk_upload_is_named_apart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_docs"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "bad_request", "reason": "missing docs"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let chunks: Vec<cloudant::Result<Bytes>> = vec![
        Ok(Bytes::from_static(br#"{"docs": "#)),
        Ok(Bytes::from_static(br#"[{"_id": "order-1"}]}"#)),
    ];
    let options =
        PostBulkDocsStreamOptions::new("orders", Box::pin(futures_util::stream::iter(chunks)));
    let error = client(&server)
        .post_bulk_docs_stream(options)
        .await
        .expect_err("rejected upload");

    check!(error.operation() == Some("postBulkDocsStream"));
    let requests = server.received_requests().await.expect("recorded");
    let_assert!([request] = requests.as_slice());
    check!(request.body == br#"{"docs": [{"_id": "order-1"}]}"#);
}

#[tokio::test]
async fn head_document_exposes_revision() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/orders/order-1"))
        .respond_with(ResponseTemplate::new(200).insert_header("etag", "\"3-xyz\""))
        .mount(&server)
        .await;

    let response = client(&server)
        .head_document(&HeadDocumentOptions::new("orders", "order-1"))
        .await
        .expect("head");

    check!(response.status() == 200);
    check!(response.etag() == Some("3-xyz"));
}

#[tokio::test]
async fn bulk_get_separates_documents_and_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/_bulk_get"))
        .and(query_param("revs", "true"))
        .and(body_json(json!({"docs": [{"id": "order-1"}, {"id": "order-2"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "order-1", "docs": [{"ok": {"_id": "order-1", "_rev": "1-abc"}}]},
                {"id": "order-2", "docs": [{"error": {
                    "id": "order-2", "rev": "undefined", "error": "not_found", "reason": "missing"
                }}]}
            ]
        })))
        .mount(&server)
        .await;

    let options = PostBulkGetOptions::new(
        "orders",
        vec![
            BulkGetQueryDocument::new("order-1"),
            BulkGetQueryDocument::new("order-2"),
        ],
    )
    .with_revs(true);
    let result = client(&server).post_bulk_get(&options).await.expect("bulk get");

    let_assert!([found, missing] = result.results.as_slice());
    let_assert!([found] = found.docs.as_slice());
    let_assert!(Some(document) = found.ok());
    check!(document.id.as_deref() == Some("order-1"));
    let_assert!([missing] = missing.docs.as_slice());
    let_assert!(Some(error) = missing.error());
    check!(error.error.as_deref() == Some("not_found"));
}

#[tokio::test]
async fn changes_stream_is_handed_over_unbuffered() {
    let server = MockServer::start().await;
    let feed = concat!(
        r#"{"seq":"1-a","id":"order-1","changes":[{"rev":"1-abc"}]}"#,
        "\n",
        r#"{"seq":"2-b","id":"order-2","changes":[{"rev":"1-def"}]}"#,
        "\n",
    );
    Mock::given(method("POST"))
        .and(path("/orders/_changes"))
        .and(query_param("feed", "continuous"))
        .and(query_param("since", "now"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(feed, "application/json"))
        .mount(&server)
        .await;

    let options = PostChangesOptions::new("orders")
        .with_feed(cloudant::ChangesFeed::Continuous)
        .with_since("now");
    let response = client(&server)
        .post_changes_as_stream(&options)
        .await
        .expect("changes");
    let bytes = response.into_body().collect().await.expect("body");

    let lines = String::from_utf8(bytes.to_vec()).expect("utf-8");
    let seqs = lines
        .lines()
        .map(|line| serde_json::from_str::<cloudant::ChangesResultItem>(line).expect("change"))
        .map(|change| change.seq)
        .collect::<Vec<_>>();
    check!(seqs == vec!["1-a", "2-b"]);
}

#[tokio::test]
async fn attachment_upload_sends_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/orders/order-1/invoices%2F2024.pdf"))
        .and(query_param("rev", "1-abc"))
        .and(header("content-type", "application/pdf"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": "order-1", "ok": true, "rev": "2-def"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let options = PutAttachmentOptions::new(
        "orders",
        "order-1",
        "invoices/2024.pdf",
        &b"%PDF-1.7"[..],
        "application/pdf",
    )
    .with_rev("1-abc");
    let result = client(&server).put_attachment(&options).await.expect("put");

    check!(result.rev.as_deref() == Some("2-def"));
    let requests = server.received_requests().await.expect("recorded");
    let_assert!([request] = requests.as_slice());
    check!(request.body == b"%PDF-1.7");
}

#[tokio::test]
async fn multipart_variant_asks_for_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/order-1"))
        .and(header("accept", ContentType::MultipartMixed.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("--abc--", "multipart/mixed; boundary=abc"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .get_document_as_mixed(&GetDocumentOptions::new("orders", "order-1"))
        .await
        .expect("multipart");

    check!(response.header("content-type") == Some("multipart/mixed; boundary=abc"));
}
