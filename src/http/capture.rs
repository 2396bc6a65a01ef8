//! Response capture for cache population.
//!
//! Wraps an outgoing body stream in a tee: every chunk is forwarded to the
//! client unchanged and appended to an in-memory buffer. Chunk boundaries and
//! streaming latency are untouched; the capture never buffers-then-flushes.
//! Once the last byte has been handed downstream, a completion hook fires
//! exactly once with the full accumulated body.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, BodyDataStream};
use bytes::{Bytes, BytesMut};
use futures_util::Stream;

/// Hook invoked with the accumulated body after the stream is exhausted.
type CompletionHook = Box<dyn FnOnce(Bytes) + Send + 'static>;

/// A body stream that duplicates every chunk into a buffer.
pub struct CaptureBody {
    inner: BodyDataStream,
    buf: BytesMut,
    on_complete: Option<CompletionHook>,
}

impl CaptureBody {
    /// Tee `body`, firing `on_complete` when the whole body has streamed.
    ///
    /// The hook does not fire if the stream ends with an error: an incomplete
    /// body must never be committed to the cache.
    pub fn wrap(body: Body, on_complete: impl FnOnce(Bytes) + Send + 'static) -> Body {
        Body::from_stream(Self {
            inner: body.into_data_stream(),
            buf: BytesMut::new(),
            on_complete: Some(Box::new(on_complete)),
        })
    }
}

impl Stream for CaptureBody {
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.buf.extend_from_slice(&chunk);
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                self.on_complete.take();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if let Some(hook) = self.on_complete.take() {
                    hook(self.buf.split().freeze());
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn capture_slot() -> (Arc<Mutex<Option<Bytes>>>, impl FnOnce(Bytes) + Send) {
        let slot = Arc::new(Mutex::new(None));
        let writer = slot.clone();
        (slot, move |body| {
            *writer.lock().unwrap() = Some(body);
        })
    }

    #[tokio::test]
    async fn tees_body_without_altering_it() {
        let (captured, hook) = capture_slot();
        let wrapped = CaptureBody::wrap(Body::from("Hello, World!"), hook);

        let downstream = axum::body::to_bytes(wrapped, usize::MAX).await.unwrap();
        assert_eq!(downstream, Bytes::from_static(b"Hello, World!"));
        assert_eq!(
            captured.lock().unwrap().as_deref(),
            Some(b"Hello, World!".as_slice())
        );
    }

    #[tokio::test]
    async fn accumulates_across_chunks() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"Hello")),
            Ok(Bytes::from_static(b", ")),
            Ok(Bytes::from_static(b"World!")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));

        let (captured, hook) = capture_slot();
        let wrapped = CaptureBody::wrap(body, hook);

        let downstream = axum::body::to_bytes(wrapped, usize::MAX).await.unwrap();
        assert_eq!(downstream, Bytes::from_static(b"Hello, World!"));
        assert_eq!(
            captured.lock().unwrap().as_deref(),
            Some(b"Hello, World!".as_slice())
        );
    }

    #[tokio::test]
    async fn empty_body_still_fires_hook() {
        let (captured, hook) = capture_slot();
        let wrapped = CaptureBody::wrap(Body::empty(), hook);

        let downstream = axum::body::to_bytes(wrapped, usize::MAX).await.unwrap();
        assert!(downstream.is_empty());
        assert_eq!(captured.lock().unwrap().as_deref(), Some(b"".as_slice()));
    }

    #[tokio::test]
    async fn stream_error_suppresses_the_hook() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "upstream died")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));

        let (captured, hook) = capture_slot();
        let wrapped = CaptureBody::wrap(body, hook);

        assert!(axum::body::to_bytes(wrapped, usize::MAX).await.is_err());
        assert!(captured.lock().unwrap().is_none());
    }
}
