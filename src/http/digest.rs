//! Body fingerprints.
//!
//! Bodies are always hashed incrementally: buffered bodies in fixed-size
//! chunks, streamed bodies chunk by chunk as the consumer reads them.

use futures::stream::{self, StreamExt};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use tokio::sync::watch;

use super::body::{Body, BodyStream};
use crate::config::{HashAlgorithm, HASH_CHUNK_SIZE};

/// Incremental hasher over the supported algorithms.
pub enum Hasher {
    /// SHA-1
    Sha1(Sha1),
    /// SHA-256
    Sha256(Sha256),
    /// SHA-384
    Sha384(Sha384),
    /// SHA-512
    Sha512(Sha512),
}

impl Hasher {
    /// A fresh hasher for `algorithm`.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Hasher::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }

    /// Feeds one chunk.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha384(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
        }
    }

    /// Lower-case hex of the final digest.
    pub fn finalize_hex(self) -> String {
        match self {
            Hasher::Sha1(h) => format!("{:x}", h.finalize()),
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Sha384(h) => format!("{:x}", h.finalize()),
            Hasher::Sha512(h) => format!("{:x}", h.finalize()),
        }
    }
}

/// Length and digest of a fully read body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyDigest {
    /// Total bytes seen.
    pub length: u64,
    /// Lower-case hex digest.
    pub hex: String,
}

impl BodyDigest {
    /// Strong entity tag built from the digest.
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.hex)
    }
}

/// Hashes a byte slice in `HASH_CHUNK_SIZE` pieces.
pub fn digest_bytes(algorithm: HashAlgorithm, data: &[u8]) -> BodyDigest {
    let mut hasher = Hasher::new(algorithm);
    for chunk in data.chunks(HASH_CHUNK_SIZE) {
        hasher.update(chunk);
    }
    BodyDigest {
        length: data.len() as u64,
        hex: hasher.finalize_hex(),
    }
}

/// Digest of an optional body, or `None` when the body is a stream that
/// cannot be read without consuming it. An absent body hashes as empty.
pub fn digest_body(algorithm: HashAlgorithm, body: Option<&Body>) -> Option<BodyDigest> {
    match body {
        None => Some(digest_bytes(algorithm, &[])),
        Some(body) => body.as_bytes().map(|bytes| digest_bytes(algorithm, bytes)),
    }
}

/// Receives the digest of a streamed body once the consumer has read it to
/// the end.
#[derive(Debug, Clone)]
pub struct DigestHandle {
    rx: watch::Receiver<Option<BodyDigest>>,
}

impl DigestHandle {
    /// The digest, if the stream has already completed.
    pub fn get(&self) -> Option<BodyDigest> {
        self.rx.borrow().clone()
    }

    /// Waits for the stream to complete. Returns `None` if it ended with an
    /// error or was dropped before reaching the end.
    pub async fn wait(&mut self) -> Option<BodyDigest> {
        if let Ok(digest) = self.rx.wait_for(Option::is_some).await {
            return (*digest).clone();
        }
        self.get()
    }
}

/// Wraps a body stream so that it counts and hashes chunks as they pass.
///
/// The returned stream yields the same chunks unchanged; the handle
/// resolves after the last chunk has been read.
pub fn digest_stream(body: BodyStream, algorithm: HashAlgorithm) -> (BodyStream, DigestHandle) {
    let (tx, rx) = watch::channel(None);
    let state = Some((body, Hasher::new(algorithm), 0u64, tx));

    let stream = stream::unfold(state, |state| async move {
        let (mut body, mut hasher, mut length, tx) = state?;
        match body.next().await {
            Some(Ok(chunk)) => {
                hasher.update(&chunk);
                length += chunk.len() as u64;
                Some((Ok(chunk), Some((body, hasher, length, tx))))
            }
            Some(Err(e)) => Some((Err(e), None)),
            None => {
                let _ = tx.send(Some(BodyDigest {
                    length,
                    hex: hasher.finalize_hex(),
                }));
                None
            }
        }
    });

    (BodyStream::new(stream), DigestHandle { rx })
}
