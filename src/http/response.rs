//! Response descriptor.

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION, VARY};
use reqwest::StatusCode;
use url::Url;

use super::body::Body;
use super::digest::DigestHandle;
use crate::config::{EVENT_STREAM_CONTENT_TYPE, MULTIPART_CONTENT_TYPE_PREFIX, REDIRECT_STATUSES};
use crate::error_handling::FetchError;
use crate::fetch::{fill_missing_headers, EventChannels};

/// A response returned by an exchange, the cache or the engine.
#[derive(Debug)]
pub struct FetchResponse {
    /// Status code.
    pub status: StatusCode,
    /// Reason phrase.
    pub status_text: String,
    /// Final URL (the last entry of `url_list`).
    pub url: Url,
    /// Every URL visited, oldest first.
    pub url_list: Vec<Url>,
    /// True if at least one redirect was followed.
    pub redirected: bool,
    /// Response headers, including any backfilled or cache-hit headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Body,
    /// Event channels for `text/event-stream` responses.
    pub events: Option<EventChannels>,
    /// Digest of a streamed body, available once the body has been read.
    pub digest: Option<DigestHandle>,
}

impl FetchResponse {
    /// Creates a response with the status's canonical reason phrase.
    pub fn new(status: StatusCode, url: Url, headers: HeaderMap, body: Body) -> Self {
        Self {
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            status,
            url_list: vec![url.clone()],
            url,
            redirected: false,
            headers,
            body,
            events: None,
            digest: None,
        }
    }

    /// True for 2xx statuses.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// True for the statuses the redirect algorithm handles.
    pub fn is_redirect(&self) -> bool {
        REDIRECT_STATUSES.contains(&self.status.as_u16())
    }

    /// Raw `Location` header value.
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Media type without parameters, lower-cased.
    pub fn media_type(&self) -> Option<String> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        let essence = value.split(';').next().unwrap_or_default().trim();
        Some(essence.to_ascii_lowercase())
    }

    /// True for `text/event-stream` bodies.
    pub fn is_event_stream(&self) -> bool {
        self.media_type().as_deref() == Some(EVENT_STREAM_CONTENT_TYPE)
    }

    /// True for content types whose bodies never end on their own schedule
    /// (event streams and multipart).
    pub fn is_streaming(&self) -> bool {
        self.media_type().is_some_and(|mt| {
            mt == EVENT_STREAM_CONTENT_TYPE || mt.starts_with(MULTIPART_CONTENT_TYPE_PREFIX)
        })
    }

    /// True if any `Vary` header lists `*`.
    pub fn varies_on_everything(&self) -> bool {
        self.headers
            .get_all(VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|field| field.trim() == "*")
    }

    /// Reads the whole body. Unread event channels are dropped first so
    /// they cannot hold back an event-stream body.
    pub async fn bytes(self) -> Result<Bytes, FetchError> {
        let FetchResponse { body, events, .. } = self;
        drop(events);
        body.bytes().await
    }

    /// Reads the body as UTF-8 (lossy).
    pub async fn text(self) -> Result<String, FetchError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Waits for a streamed body's digest and fills in missing
    /// `Content-Length` / `ETag`. Call after the body has been read to the
    /// end; returns true if a header was added.
    pub async fn apply_stream_digest(&mut self) -> bool {
        let Some(handle) = self.digest.as_mut() else {
            return false;
        };
        match handle.wait().await {
            Some(digest) => fill_missing_headers(&mut self.headers, &digest),
            None => false,
        }
    }

    /// Clones a response with a buffered body. Event channels and digest
    /// handles are not carried over.
    pub fn try_clone(&self) -> Option<FetchResponse> {
        Some(FetchResponse {
            status: self.status,
            status_text: self.status_text.clone(),
            url: self.url.clone(),
            url_list: self.url_list.clone(),
            redirected: self.redirected,
            headers: self.headers.clone(),
            body: self.body.try_clone()?,
            events: None,
            digest: None,
        })
    }
}
