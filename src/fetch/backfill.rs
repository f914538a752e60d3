//! `Content-Length` / `ETag` backfill.
//!
//! Buffered bodies are hashed immediately. Streamed bodies are wrapped so the
//! digest is computed while the caller reads; the values become available
//! through the response's [`DigestHandle`](crate::http::DigestHandle).

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, ETAG};

use crate::config::HashAlgorithm;
use crate::http::{digest_bytes, digest_stream, Body, BodyDigest, FetchResponse};

/// Inserts `Content-Length` and `ETag` from `digest` where they are missing.
/// Returns true if any header was added.
pub fn fill_missing_headers(headers: &mut HeaderMap, digest: &BodyDigest) -> bool {
    let mut added = false;
    if !headers.contains_key(CONTENT_LENGTH) {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(digest.length));
        added = true;
    }
    if !headers.contains_key(ETAG) {
        if let Ok(etag) = HeaderValue::from_str(&digest.etag()) {
            headers.insert(ETAG, etag);
            added = true;
        }
    }
    added
}

/// Backfills a response: headers right away for a buffered body, a digest
/// handle for a streamed one.
pub fn backfill(response: &mut FetchResponse, algorithm: HashAlgorithm) {
    match std::mem::take(&mut response.body) {
        Body::Full(bytes) => {
            let digest = digest_bytes(algorithm, &bytes);
            fill_missing_headers(&mut response.headers, &digest);
            response.body = Body::Full(bytes);
        }
        Body::Stream(stream) => {
            let (stream, handle) = digest_stream(stream, algorithm);
            response.body = Body::Stream(stream);
            response.digest = Some(handle);
        }
    }
}
