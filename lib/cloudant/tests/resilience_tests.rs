//! Retry, authentication, cancellation and deadline behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use assert2::{check, let_assert};
use cloudant::header::{HeaderMap, HeaderValue};
use cloudant::{
    Authentication, CancellationToken, CloudantClient, DatabaseOptions, ErrorKind,
    PostFindOptions,
};
use serde_json::json;
use url::Url;
use wiremock::{
    Mock, MockServer, Request, Respond, ResponseTemplate,
    matchers::{body_json, body_string_contains, header, method, path},
};

fn builder(server: &MockServer) -> cloudant::CloudantClientBuilder {
    CloudantClient::builder()
        .base_url(server.uri())
        .gzip_requests(false)
        .backoff(Duration::from_millis(1), Duration::from_millis(10))
}

fn database_information() -> serde_json::Value {
    json!({
        "cluster": {"n": 3, "q": 16, "r": 2, "w": 2},
        "db_name": "orders",
        "doc_count": 12,
        "doc_del_count": 1,
        "sizes": {"active": 100, "external": 80, "file": 400},
        "update_seq": "12-abc"
    })
}

#[tokio::test]
async fn transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/_find"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders/_find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"docs": []})))
        .mount(&server)
        .await;

    let client = builder(&server).build().expect("client");
    let result = client
        .post_find(&PostFindOptions::new("orders", json!({"status": "open"})))
        .await
        .expect("find");

    check!(result.docs.is_empty());
    let requests = server.received_requests().await.expect("recorded");
    check!(requests.len() == 3);
    for request in &requests {
        check!(request.body == br#"{"selector":{"status":"open"}}"#);
    }
}

#[tokio::test]
async fn retries_stop_at_the_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = builder(&server).max_retries(2).build().expect("client");
    let error = client
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect_err("server keeps failing");

    check!(error.kind() == ErrorKind::ServerError);
    check!(error.status() == Some(500));
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad_request"})))
        .expect(1)
        .mount(&server)
        .await;

    let error = builder(&server)
        .build()
        .expect("client")
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect_err("bad request");

    check!(error.kind() == ErrorKind::ClientError);
}

#[tokio::test]
async fn retry_after_is_honored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_information()))
        .mount(&server)
        .await;

    let client = builder(&server)
        .backoff(Duration::from_millis(1), Duration::from_secs(2))
        .build()
        .expect("client");
    let started = Instant::now();
    let info = client
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect("database information");

    check!(info.db_name == "orders");
    check!(started.elapsed() >= Duration::from_millis(950));
}

#[tokio::test]
async fn iam_token_is_fetched_once_for_concurrent_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(body_string_contains("apikey=secret-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-1", "expires_in": 3600}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_information()))
        .expect(8)
        .mount(&server)
        .await;

    let token_url = Url::parse(&format!("{}/identity/token", server.uri())).expect("url");
    let client = builder(&server)
        .authentication(Authentication::Iam {
            api_key: "secret-key".to_string(),
            token_url: Some(token_url),
        })
        .build()
        .expect("client");

    let calls = (0..8).map(|_| {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .get_database_information(&DatabaseOptions::new("orders"))
                .await
        })
    });
    for call in futures_util::future::join_all(calls).await {
        let_assert!(Ok(Ok(info)) = call);
        check!(info.doc_count == 12);
    }
}

#[tokio::test]
async fn iam_token_failure_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"errorMessage": "invalid apikey"})),
        )
        .mount(&server)
        .await;

    let token_url = Url::parse(&format!("{}/identity/token", server.uri())).expect("url");
    let client = builder(&server)
        .authentication(Authentication::Iam {
            api_key: "bad-key".to_string(),
            token_url: Some(token_url),
        })
        .build()
        .expect("client");
    let error = client
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect_err("token rejected");

    check!(error.kind() == ErrorKind::AuthError);
    let requests = server.received_requests().await.expect("recorded");
    check!(requests.iter().all(|request| request.url.path() == "/identity/token"));
}

/// Hands out a new `AuthSession` cookie on every login.
struct SessionLogin(AtomicUsize);

impl Respond for SessionLogin {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let login = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        ResponseTemplate::new(200)
            .insert_header(
                "set-cookie",
                format!("AuthSession=cookie-{login}; Version=1; Path=/; HttpOnly; Max-Age=600"),
            )
            .set_body_json(json!({"ok": true, "name": "admin", "roles": ["_admin"]}))
    }
}

#[tokio::test]
async fn rejected_session_cookie_is_renewed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_session"))
        .and(body_json(json!({"name": "admin", "password": "pass"})))
        .respond_with(SessionLogin(AtomicUsize::new(0)))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("cookie", "AuthSession=cookie-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("cookie", "AuthSession=cookie-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_information()))
        .mount(&server)
        .await;

    let client = builder(&server)
        .authentication(Authentication::session("admin", "pass"))
        .build()
        .expect("client");
    let info = client
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect("database information");

    check!(info.db_name == "orders");
}

#[tokio::test]
async fn basic_credentials_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/orders"))
        .and(header("authorization", "Basic YWRtaW46cGFzcw=="))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = builder(&server)
        .authentication(Authentication::basic("admin", "pass"))
        .build()
        .expect("client")
        .head_database(&DatabaseOptions::new("orders"))
        .await
        .expect("head");

    check!(response.status() == 200);
}

#[tokio::test]
async fn caller_headers_never_replace_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Basic YWRtaW46cGFzcw=="))
        .and(header("x-request-origin", "billing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_information()))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("Bearer forged"));
    headers.insert("x-request-origin", HeaderValue::from_static("billing"));
    let info = builder(&server)
        .authentication(Authentication::basic("admin", "pass"))
        .build()
        .expect("client")
        .with_headers(headers)
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect("database information");

    check!(info.db_name == "orders");
    let requests = server.received_requests().await.expect("recorded");
    let_assert!([request] = requests.as_slice());
    check!(request.headers.get_all("authorization").iter().count() == 1);
}

#[tokio::test]
async fn deadline_spans_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(database_information())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = builder(&server).build().expect("client");
    let started = Instant::now();
    let error = client
        .with_deadline(Duration::from_millis(200))
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect_err("deadline exceeded");

    check!(error.kind() == ErrorKind::Timeout);
    check!(error.operation() == Some("getDatabaseInformation"));
    check!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn cancellation_aborts_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(database_information())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = builder(&server).build().expect("client");
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let error = client
        .with_cancellation(token)
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect_err("cancelled");

    check!(error.kind() == ErrorKind::Cancelled);
}

#[tokio::test]
async fn closed_client_sends_nothing() {
    let server = MockServer::start().await;
    let client = builder(&server).build().expect("client");
    let clone = client.clone();

    client.close();
    let error = clone
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect_err("closed");

    check!(clone.is_closed());
    check!(error.kind() == ErrorKind::Cancelled);
    let requests = server.received_requests().await.expect("recorded");
    check!(requests.is_empty());
}

#[tokio::test]
async fn custom_layers_see_every_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(database_information()))
        .mount(&server)
        .await;

    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let client = builder(&server)
        .layer(tower::layer::layer_fn(move |service: cloudant::BoxedService| {
            let counter = Arc::clone(&counter);
            tower::service_fn(move |request: cloudant::Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                tower::ServiceExt::oneshot(service.clone(), request)
            })
        }))
        .build()
        .expect("client");
    client
        .get_database_information(&DatabaseOptions::new("orders"))
        .await
        .expect("database information");

    check!(attempts.load(Ordering::SeqCst) == 2);
}
