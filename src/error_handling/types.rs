//! Error type definitions.
//!
//! This module defines all error, rejection, and info types used throughout the crate.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Boxed error used for failures reported by external collaborators
/// (the HTTP transport, body streams).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Errors produced by the DNS wire codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsError {
    /// A length or count in the packet claims more bytes than the buffer holds,
    /// or a compression pointer does not point strictly backwards.
    #[error("Malformed DNS packet while reading {context} at offset {offset}: needed {needed} bytes, {available} available")]
    MalformedPacket {
        /// What was being decoded when the packet ran out.
        context: &'static str,
        /// Offset of the failing read.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes remaining in the buffer from `offset`.
        available: usize,
    },

    /// Invalid input to the DNS encoder (label too long, unknown record type name, ...).
    #[error("DNS encode error: {0}")]
    Encode(String),
}

/// Reasons a response cache refuses to store a request/response pair.
///
/// These mirror the constraints the platform Cache API enforces on `put`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheRejection {
    /// Only GET requests are cacheable unless the method is explicitly ignored.
    #[error("Cannot cache a {0} request")]
    Method(String),

    /// 206 responses are ambiguous without range tracking.
    #[error("Cannot cache a partial (206) response")]
    PartialContent,

    /// `Vary: *` makes the response unmatchable.
    #[error("Cannot cache a response with Vary: *")]
    VaryWildcard,

    /// Only buffered bodies can be stored; a stream would be consumed.
    #[error("Cannot cache a streamed body")]
    StreamingBody,
}

/// Error type for every fallible fetch or DoH operation.
#[derive(Error, Debug)]
pub enum FetchError {
    /// DNS wire encoding or decoding failed.
    #[error(transparent)]
    Dns(#[from] DnsError),

    /// The exchange exceeded its deadline and was aborted.
    #[error("Request to {url} timed out after {after:?}")]
    Timeout {
        /// URL of the aborted exchange.
        url: String,
        /// Deadline that expired.
        after: Duration,
    },

    /// The caller cancelled the request's abort token.
    #[error("Request to {url} was aborted")]
    Aborted {
        /// URL of the aborted exchange.
        url: String,
    },

    /// The upstream answered with a status the caller did not accept.
    #[error("Upstream {url} returned HTTP {status} after {hops} redirect(s): {reason}")]
    Upstream {
        /// URL that produced the status.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Redirects followed before the final response.
        hops: usize,
        /// Reason phrase (or provider error message).
        reason: String,
    },

    /// The redirect algorithm refused to continue.
    #[error("Network error for {url} after {hops} redirect(s): {reason}")]
    Network {
        /// URL of the response that triggered the violation.
        url: String,
        /// Redirects followed before the failure.
        hops: usize,
        /// What went wrong.
        reason: String,
    },

    /// The response cache refused a `put`.
    #[error("Cache rejected response: {0}")]
    CacheRejected(#[from] CacheRejection),

    /// The underlying transport failed before producing a response.
    #[error("Transport failure for {url}: {source}")]
    Transport {
        /// URL being fetched.
        url: String,
        /// Underlying error.
        #[source]
        source: BoxError,
    },

    /// A response body could not be decoded (e.g. invalid DoH JSON).
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        /// URL the body came from.
        url: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Builds a `Network` error.
    pub(crate) fn network(url: impl Into<String>, hops: usize, reason: impl Into<String>) -> Self {
        FetchError::Network {
            url: url.into(),
            hops,
            reason: reason.into(),
        }
    }

    /// Builds a `Transport` error from any error type.
    pub(crate) fn transport<E>(url: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        FetchError::Transport {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    /// Returns true if this error came from the redirect algorithm.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }
}

/// Categories of errors recorded in [`super::FetchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// A DNS packet could not be decoded.
    MalformedPacket,
    /// A DNS query could not be encoded.
    DnsEncodeError,
    /// An exchange exceeded its deadline.
    Timeout,
    /// The caller cancelled the request.
    Aborted,
    /// Upstream returned 4xx.
    UpstreamClientError,
    /// Upstream returned 5xx.
    UpstreamServerError,
    /// Upstream returned another unaccepted status.
    UpstreamOtherError,
    /// The redirect algorithm refused to continue.
    RedirectViolation,
    /// The cache refused to store a response.
    CacheRejected,
    /// The transport failed before a response arrived.
    TransportError,
    /// A DoH JSON body did not match the provider schema.
    DecodeError,
}

/// Types of informational metrics recorded during fetching.
///
/// Info metrics track useful data points that aren't errors, such as
/// cache hits and redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// Served from the cache.
    CacheHit,
    /// Looked up in the cache without a match.
    CacheMiss,
    /// Stored in the cache.
    CacheStore,
    /// A redirect was followed.
    Redirect,
    /// A redirect crossed origins.
    CrossOriginRedirect,
    /// A redirect rewrote the method to GET.
    MethodRewrite,
    /// An event-stream body was demultiplexed.
    EventStream,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    /// Human-readable label used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::MalformedPacket => "Malformed DNS packet",
            ErrorType::DnsEncodeError => "DNS encode error",
            ErrorType::Timeout => "Request timeout",
            ErrorType::Aborted => "Request aborted",
            ErrorType::UpstreamClientError => "Upstream client error (4xx)",
            ErrorType::UpstreamServerError => "Upstream server error (5xx)",
            ErrorType::UpstreamOtherError => "Upstream other error",
            ErrorType::RedirectViolation => "Redirect violation",
            ErrorType::CacheRejected => "Cache rejected",
            ErrorType::TransportError => "Transport error",
            ErrorType::DecodeError => "Response decode error",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::CacheHit => "Cache hit",
            InfoType::CacheMiss => "Cache miss",
            InfoType::CacheStore => "Cache store",
            InfoType::Redirect => "HTTP redirect",
            InfoType::CrossOriginRedirect => "Cross-origin redirect",
            InfoType::MethodRewrite => "Redirect method rewrite",
            InfoType::EventStream => "Event stream response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(ErrorType::Timeout.as_str(), "Request timeout");
        assert_eq!(ErrorType::MalformedPacket.as_str(), "Malformed DNS packet");
        assert_eq!(
            ErrorType::UpstreamClientError.as_str(),
            "Upstream client error (4xx)"
        );
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_all_info_types_have_string_representation() {
        for info_type in InfoType::iter() {
            assert!(
                !info_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                info_type
            );
        }
    }

    #[test]
    fn test_malformed_packet_message_carries_context() {
        let err = DnsError::MalformedPacket {
            context: "rdata",
            offset: 40,
            needed: 16,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("rdata"));
        assert!(msg.contains("40"));
        assert!(msg.contains("16"));
    }

    #[test]
    fn test_network_error_carries_hops() {
        let err = FetchError::network("http://a.example/", 3, "redirect count exceeded");
        assert!(err.is_network());
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("3 redirect(s)"));
    }

    #[test]
    fn test_cache_rejection_converts_into_fetch_error() {
        let err: FetchError = CacheRejection::PartialContent.into();
        assert!(matches!(
            err,
            FetchError::CacheRejected(CacheRejection::PartialContent)
        ));
    }
}
