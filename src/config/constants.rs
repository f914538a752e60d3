//! Configuration constants.
//!
//! This module defines all configuration constants used throughout the crate,
//! including timeouts, limits, header names and media types.

use std::time::Duration;

// Built-in defaults (lowest precedence layer)
/// Maximum number of redirects followed by one fetch call.
/// Matches the WHATWG fetch limit.
pub const DEFAULT_REDIRECT_COUNT: usize = 20;
/// Per-exchange timeout applied when no override is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default DoH query timeout.
/// Most providers answer in well under a second; 5s fails fast on dead upstreams.
pub const DOH_TIMEOUT: Duration = Duration::from_secs(5);

/// Path that marks a DoH provider URL as speaking `application/dns-message`.
pub const DOH_CANONICAL_PATH: &str = "/dns-query";

// Media types
/// Binary DoH wire format (RFC 8484).
pub const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";
/// JSON DoH format served by resolvers such as Cloudflare and Google.
pub const DNS_JSON_CONTENT_TYPE: &str = "application/dns-json";
/// Server-sent events.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";
/// Any multipart media type.
pub const MULTIPART_CONTENT_TYPE_PREFIX: &str = "multipart/";

/// Items buffered per event-stream channel (pass-through body, text and
/// JSON) before the reader task waits for the consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Header added to responses served from a cache tier.
/// Never present on a response that came from the network.
pub const CACHE_HIT_HEADER: &str = "x-fetch-hole-cache";

/// Headers describing a request body; dropped together with the body
/// when a redirect rewrites the method to GET.
pub const REQUEST_BODY_HEADERS: &[&str] = &[
    "content-encoding",
    "content-language",
    "content-location",
    "content-type",
];

/// Statuses handled by the redirect algorithm.
pub const REDIRECT_STATUSES: &[u16] = &[301, 302, 303, 307, 308];

/// Chunk size used when hashing buffered bodies incrementally.
pub const HASH_CHUNK_SIZE: usize = 8 * 1024;

/// Not Modified; accepted from DoH providers alongside 2xx.
pub const HTTP_STATUS_NOT_MODIFIED: u16 = 304;
/// Partial Content; never cached.
pub const HTTP_STATUS_PARTIAL_CONTENT: u16 = 206;
