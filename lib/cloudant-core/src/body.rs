//! Body serialization and compression utilities.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use futures_util::StreamExt;

use crate::request::ByteStream;
use crate::{Error, Result};

/// Content type for request and response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
    /// MIME multipart with mixed parts (`multipart/mixed`).
    MultipartMixed,
    /// MIME multipart with related parts (`multipart/related`).
    MultipartRelated,
    /// Anything (`*/*`).
    Any,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::OctetStream => "application/octet-stream",
            Self::MultipartMixed => "multipart/mixed",
            Self::MultipartRelated => "multipart/related",
            Self::Any => "*/*",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails, including when a value
/// refuses to serialize (such as an unknown enum value).
///
/// # Example
///
/// ```
/// use cloudant_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Db { name: String }
///
/// let db = Db { name: "animals".to_string() };
/// let bytes = to_json(&db).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"animals"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Errors
///
/// Returns an error if form serialization fails.
///
/// # Example
///
/// ```
/// use cloudant_core::to_form;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Grant<'a> { grant_type: &'a str, apikey: &'a str }
///
/// let bytes = to_form(&Grant { grant_type: "password", apikey: "k" }).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"grant_type=password&apikey=k");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with location-aware error messages.
///
/// Failures carry a JSON pointer to the offending value (for example
/// `/rows/3/doc/_rev`) and keep the original body.
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`] if the body does not match `T`.
///
/// # Example
///
/// ```
/// use cloudant_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Ack { ok: bool }
///
/// let ok: Ack = from_json(br#"{"ok":true}"#).expect("deserialize");
/// assert_eq!(ok, Ack { ok: true });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::JsonDeserialization {
        pointer: json_pointer(e.path()),
        message: e.inner().to_string(),
        body: Some(Bytes::copy_from_slice(bytes)),
    })
}

fn json_pointer(path: &serde_path_to_error::Path) -> String {
    use serde_path_to_error::Segment;

    let mut pointer = String::new();
    for segment in path.iter() {
        pointer.push('/');
        match segment {
            Segment::Seq { index } => pointer.push_str(&index.to_string()),
            Segment::Map { key } => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
            Segment::Enum { variant } => pointer.push_str(variant),
            _ => pointer.push('?'),
        }
    }
    pointer
}

// ============================================================================
// Compression
// ============================================================================

/// Gzip-compress a buffered body.
///
/// # Errors
///
/// Returns an encode error if the compressor fails.
pub fn gzip(body: &[u8]) -> Result<Bytes> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
    encoder
        .write_all(body)
        .and_then(|()| encoder.finish())
        .map(Bytes::from)
        .map_err(|e| Error::encode(format!("gzip compression failed: {e}")))
}

/// Gzip-compress a stream of chunks incrementally.
///
/// Compressed output is emitted as it becomes available; the gzip trailer is
/// emitted once the input stream ends.
#[must_use]
pub fn gzip_stream(input: ByteStream) -> ByteStream {
    struct State {
        input: ByteStream,
        encoder: Option<GzEncoder<Vec<u8>>>,
    }

    let state = State {
        input,
        encoder: Some(GzEncoder::new(Vec::new(), Compression::default())),
    };

    Box::pin(futures_util::stream::unfold(state, |mut state| async move {
        loop {
            let encoder = state.encoder.as_mut()?;
            match state.input.next().await {
                Some(Ok(chunk)) => {
                    if let Err(e) = encoder.write_all(&chunk) {
                        state.encoder = None;
                        return Some((Err(Error::encode(format!("gzip compression failed: {e}"))), state));
                    }
                    let out = std::mem::take(encoder.get_mut());
                    if !out.is_empty() {
                        return Some((Ok(Bytes::from(out)), state));
                    }
                }
                Some(Err(e)) => {
                    state.encoder = None;
                    return Some((Err(e), state));
                }
                None => {
                    let encoder = state.encoder.take()?;
                    let tail = encoder
                        .finish()
                        .map(Bytes::from)
                        .map_err(|e| Error::encode(format!("gzip compression failed: {e}")));
                    return Some((tail, state));
                }
            }
        }
    }))
}

/// Decompress a buffered body according to its `Content-Encoding`.
///
/// Unknown encodings are passed through unchanged.
///
/// # Errors
///
/// Returns a decode error if the compressed data is corrupt.
pub fn decompress(encoding: &str, body: Bytes) -> Result<Bytes> {
    let result = match encoding.trim().to_ascii_lowercase().as_str() {
        "gzip" | "x-gzip" => {
            let mut decoder = flate2::read::GzDecoder::new(body.as_ref());
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| Error::decode(format!("gzip decompression failed: {e}")))?;
            Bytes::from(decompressed)
        }
        "deflate" => {
            let mut decoder = flate2::read::ZlibDecoder::new(body.as_ref());
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| Error::decode(format!("deflate decompression failed: {e}")))?;
            Bytes::from(decompressed)
        }
        _ => body,
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(
            ContentType::FormUrlEncoded.as_str(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(ContentType::MultipartRelated.as_str(), "multipart/related");
        assert_eq!(ContentType::Any.to_string(), "*/*");
    }

    #[test]
    fn to_form_serialize() {
        #[derive(serde::Serialize)]
        struct Grant {
            grant_type: String,
            apikey: String,
        }

        let grant = Grant {
            grant_type: "urn:ibm:params:oauth:grant-type:apikey".to_string(),
            apikey: "a b".to_string(),
        };

        let bytes = to_form(&grant).expect("serialize");
        assert_eq!(
            bytes.as_ref(),
            b"grant_type=urn%3Aibm%3Aparams%3Aoauth%3Agrant-type%3Aapikey&apikey=a+b"
        );
    }

    #[test]
    fn from_json_deserialize() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Row {
            id: String,
            value: u32,
        }

        let row: Row = from_json(br#"{"id":"a","value":3}"#).expect("deserialize");
        assert_eq!(
            row,
            Row {
                id: "a".to_string(),
                value: 3,
            }
        );
    }

    #[test]
    fn from_json_syntax_error_keeps_body() {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            #[allow(dead_code)]
            id: String,
        }

        let result: Result<Row> = from_json(b"not json");
        let err = result.expect_err("should fail");

        assert!(err.to_string().contains("JSON deserialization error"));
        assert_eq!(err.raw_body().map(Bytes::as_ref), Some(b"not json".as_ref()));
    }

    #[test]
    fn from_json_reports_json_pointer() {
        #[derive(Debug, serde::Deserialize)]
        struct Doc {
            #[allow(dead_code)]
            #[serde(rename = "_rev")]
            rev: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct RowDoc {
            #[allow(dead_code)]
            doc: Doc,
        }

        #[derive(Debug, serde::Deserialize)]
        struct Rows {
            #[allow(dead_code)]
            rows: Vec<RowDoc>,
        }

        let bytes = br#"{"rows":[{"doc":{"_rev":"1-a"}},{"doc":{"_rev":7}}]}"#;
        let err = from_json::<Rows>(bytes).expect_err("should fail");

        let Error::JsonDeserialization { pointer, .. } = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(pointer, "/rows/1/doc/_rev");
    }

    #[test]
    fn json_pointer_escapes_keys() {
        let mut deserializer = serde_json::Deserializer::from_str(r#"{"a/b":{"c~d":"x"}}"#);
        let result: std::result::Result<std::collections::HashMap<String, std::collections::HashMap<String, u8>>, _> =
            serde_path_to_error::deserialize(&mut deserializer);
        let err = result.expect_err("should fail");

        assert_eq!(json_pointer(err.path()), "/a~1b/c~0d");
    }

    #[test]
    fn gzip_roundtrips_through_decompress() {
        let original = br#"{"docs":[{"_id":"a"}]}"#;
        let compressed = gzip(original).expect("gzip");

        assert_ne!(compressed.as_ref(), original);
        let result = decompress("gzip", compressed).expect("decompress");
        assert_eq!(result.as_ref(), original);
    }

    #[test]
    fn decompress_identity_and_unknown() {
        let body = Bytes::from("hello world");
        assert_eq!(decompress("identity", body.clone()).expect("identity"), body);
        assert_eq!(decompress("", body.clone()).expect("empty"), body);
        assert_eq!(decompress("br", body.clone()).expect("unknown"), body);
    }

    #[test]
    fn decompress_deflate() {
        use flate2::write::ZlibEncoder;

        let original = b"hello world";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).expect("write");
        let compressed = encoder.finish().expect("finish");

        let result = decompress("deflate", Bytes::from(compressed)).expect("decompress");
        assert_eq!(result.as_ref(), original);
    }

    #[test]
    fn decompress_corrupt_gzip_is_decode_error() {
        let err = decompress("gzip", Bytes::from_static(b"\x1f\x8bnope")).expect_err("corrupt");
        assert_eq!(err.kind(), crate::ErrorKind::DecodeError);
    }

    #[tokio::test]
    async fn gzip_stream_produces_valid_gzip() {
        let chunks: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from("[{\"_id\":\"a\"},")),
            Ok(Bytes::from("{\"_id\":\"b\"}]")),
        ]));

        let compressed = crate::Body::new(gzip_stream(chunks))
            .collect()
            .await
            .expect("collect");

        let result = decompress("gzip", compressed).expect("decompress");
        assert_eq!(result.as_ref(), b"[{\"_id\":\"a\"},{\"_id\":\"b\"}]");
    }

    #[tokio::test]
    async fn gzip_stream_forwards_errors() {
        let chunks: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from("[")),
            Err(Error::connection("source failed")),
        ]));

        let err = crate::Body::new(gzip_stream(chunks))
            .collect()
            .await
            .expect_err("should fail");
        assert!(err.is_connection());
    }
}
