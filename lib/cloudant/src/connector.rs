//! HTTPS connector using rustls.

use std::time::Duration;

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;

const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// Create an HTTPS connector with rustls.
///
/// Plain `http://` base URLs are accepted as well, which local CouchDB
/// installs and mock servers rely on. Both HTTP/1.1 and HTTP/2 are offered,
/// with TLS verified against the Mozilla root certificates.
#[must_use]
pub fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));
    http.set_nodelay(true);
    // Continuous changes feeds hold a connection open for hours.
    http.set_keepalive(Some(TCP_KEEPALIVE));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_connector() {
        let _connector = https_connector(Duration::from_secs(1));
    }
}
