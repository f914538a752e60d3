//! Request and response descriptors.
//!
//! This module provides:
//! - `FetchRequest` / `FetchResponse` with header multimaps and bodies
//! - `Body`, buffered or streamed once
//! - Incremental body digests (SHA-1 / SHA-2)
//! - Origin and referrer-policy helpers used by the redirect algorithm

mod body;
mod digest;
mod origin;
mod request;
mod response;

// Re-export public API
pub use body::{Body, BodyStream};
pub use digest::{
    digest_body, digest_bytes, digest_stream, BodyDigest, DigestHandle, Hasher,
};
pub use origin::{
    includes_credentials, is_http_scheme, same_origin, strip_for_referrer, ReferrerPolicy,
};
pub use request::{CredentialsMode, FetchRequest, RequestMode};
pub use response::FetchResponse;
