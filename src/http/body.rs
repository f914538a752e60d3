//! Request and response bodies.

use std::fmt;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error_handling::FetchError;

/// A boxed stream of body chunks.
///
/// The inner stream only has to be `Send`. It is reached through `&mut self`
/// alone, so the mutex never blocks, and bodies stay `Sync` for responses
/// held by the shared cache or borrowed across an `.await`.
pub struct BodyStream(Mutex<BoxStream<'static, Result<Bytes, FetchError>>>);

impl BodyStream {
    /// Boxes a chunk stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, FetchError>> + Send + 'static,
    {
        Self(Mutex::new(stream.boxed()))
    }
}

impl Stream for BodyStream {
    type Item = Result<Bytes, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut()
            .0
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .poll_next_unpin(cx)
    }
}

impl fmt::Debug for BodyStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BodyStream")
    }
}

/// A body that is either fully buffered or read once from a stream.
///
/// Buffered bodies can be re-sent on a redirect and hashed any number of
/// times; stream bodies can be consumed exactly once.
pub enum Body {
    /// In-memory body.
    Full(Bytes),
    /// Body produced incrementally.
    Stream(BodyStream),
}

impl Body {
    /// An empty buffered body.
    pub fn empty() -> Self {
        Body::Full(Bytes::new())
    }

    /// Wraps a chunk stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, FetchError>> + Send + 'static,
    {
        Body::Stream(BodyStream::new(stream))
    }

    /// True if the body can be read again (it is buffered).
    pub fn is_reusable(&self) -> bool {
        matches!(self, Body::Full(_))
    }

    /// The buffered bytes, if the body is buffered.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Body::Full(bytes) => Some(bytes),
            Body::Stream(_) => None,
        }
    }

    /// Clones a buffered body. Stream bodies cannot be cloned.
    pub fn try_clone(&self) -> Option<Body> {
        self.as_bytes().map(|bytes| Body::Full(bytes.clone()))
    }

    /// Reads the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes, FetchError> {
        match self {
            Body::Full(bytes) => Ok(bytes),
            Body::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Converts the body into a chunk stream.
    pub fn into_stream(self) -> BodyStream {
        match self {
            Body::Full(bytes) if bytes.is_empty() => BodyStream::new(stream::empty()),
            Body::Full(bytes) => BodyStream::new(stream::once(async move { Ok(bytes) })),
            Body::Stream(stream) => stream,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Body::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Full(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Full(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Full(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::Full(Bytes::from_static(text.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_body_collects() {
        let chunks = vec![Ok(Bytes::from("hel")), Ok(Bytes::from("lo"))];
        let body = Body::from_stream(stream::iter(chunks));
        assert!(!body.is_reusable());
        assert!(body.try_clone().is_none());
        assert_eq!(body.bytes().await.unwrap(), Bytes::from("hello"));
    }

    #[tokio::test]
    async fn test_full_body_round_trips_through_stream() {
        let body = Body::from("data");
        let copy = body.try_clone().unwrap();
        let collected = Body::Stream(body.into_stream()).bytes().await.unwrap();
        assert_eq!(collected, copy.bytes().await.unwrap());
    }

    #[test]
    fn test_bodies_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BodyStream>();
        assert_send_sync::<Body>();
    }

    #[tokio::test]
    async fn test_stream_error_propagates() {
        let chunks = vec![
            Ok(Bytes::from("a")),
            Err(FetchError::network("http://a.example/", 0, "reset")),
        ];
        let err = Body::from_stream(stream::iter(chunks)).bytes().await.unwrap_err();
        assert!(err.is_network());
    }
}
