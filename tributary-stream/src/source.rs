//! Pull-mode byte sources.
//!
//! A [`ByteSource`] is opened once per run and yields a [`ByteReader`]. The
//! orchestrator holds the reader in a [`ReaderGuard`], which releases it on
//! every exit path: completion, failure, or the consumer dropping the run.
//!
//! [`ByteSource`] and [`ByteReader`] use RPITIT and are NOT object-safe; the
//! orchestrator is generic over them.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use tributary_types::StreamError;

/// An open, readable byte stream.
pub trait ByteReader: Send {
    /// The next block of bytes, or `None` at end of stream.
    ///
    /// A producer failure (network error, backend error) is reported as
    /// [`StreamError::Upstream`].
    fn read(&mut self) -> impl Future<Output = Result<Option<Bytes>, StreamError>> + Send;

    /// Give up the underlying handle. Called exactly once by
    /// [`ReaderGuard`]; reads after release return `None`.
    fn release(&mut self) {}
}

/// Something that can be opened into a [`ByteReader`].
pub trait ByteSource: Send {
    /// The reader this source opens into.
    type Reader: ByteReader;

    /// Acquire the reader. Fails with [`StreamError::UnreadableSource`] when
    /// there is nothing to read, or [`StreamError::Upstream`] when the
    /// producer already reported a failure.
    fn open(self) -> impl Future<Output = Result<Self::Reader, StreamError>> + Send;
}

/// Scoped ownership of an open reader: releases it when dropped.
pub struct ReaderGuard<R: ByteReader> {
    reader: R,
    released: bool,
}

impl<R: ByteReader> ReaderGuard<R> {
    /// Take ownership of an open reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            released: false,
        }
    }

    /// Read the next block; `None` once released.
    pub async fn read(&mut self) -> Result<Option<Bytes>, StreamError> {
        if self.released {
            return Ok(None);
        }
        self.reader.read().await
    }

    /// Release now rather than at drop.
    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.reader.release();
        }
    }

    /// Whether the reader has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<R: ByteReader> Drop for ReaderGuard<R> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Adapts any fallible byte stream (an HTTP body, a channel) into a source
/// and reader. Releasing drops the stream.
pub struct ByteStream<S> {
    inner: Option<Pin<Box<S>>>,
}

impl<S> ByteStream<S> {
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: Some(Box::pin(stream)),
        }
    }
}

impl<S, B, E> ByteReader for ByteStream<S>
where
    S: Stream<Item = Result<B, E>> + Send,
    B: Into<Bytes>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    async fn read(&mut self) -> Result<Option<Bytes>, StreamError> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };
        match inner.next().await {
            Some(Ok(block)) => Ok(Some(block.into())),
            Some(Err(e)) => Err(StreamError::Upstream(e.into())),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.inner = None;
    }
}

impl<S, B, E> ByteSource for ByteStream<S>
where
    S: Stream<Item = Result<B, E>> + Send,
    B: Into<Bytes>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Reader = Self;

    async fn open(self) -> Result<Self, StreamError> {
        Ok(self)
    }
}

/// A source over any [`tokio::io::AsyncRead`] (a file, a pipe, a socket).
pub struct AsyncReadSource<R> {
    reader: R,
}

impl<R> AsyncReadSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R> ByteSource for AsyncReadSource<R>
where
    R: tokio::io::AsyncRead + Send,
{
    type Reader = ByteStream<tokio_util::io::ReaderStream<R>>;

    async fn open(self) -> Result<Self::Reader, StreamError> {
        Ok(ByteStream::new(tokio_util::io::ReaderStream::new(
            self.reader,
        )))
    }
}

/// The body stream of an HTTP response.
pub type ResponseBody = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

impl ByteSource for reqwest::Response {
    type Reader = ByteStream<ResponseBody>;

    async fn open(self) -> Result<Self::Reader, StreamError> {
        let status = self.status();
        if !status.is_success() {
            let body = self.text().await.unwrap_or_default();
            return Err(StreamError::upstream(format!(
                "backend returned {status}: {body}"
            )));
        }
        Ok(ByteStream::new(Box::pin(self.bytes_stream())))
    }
}

/// A body that may be missing. `None` opens as
/// [`StreamError::UnreadableSource`].
impl<S: ByteSource> ByteSource for Option<S> {
    type Reader = S::Reader;

    async fn open(self) -> Result<Self::Reader, StreamError> {
        match self {
            Some(source) => source.open().await,
            None => Err(StreamError::UnreadableSource(
                "response body is not readable".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReader {
        blocks: Vec<&'static [u8]>,
        releases: Arc<AtomicUsize>,
    }

    impl ByteReader for CountingReader {
        async fn read(&mut self) -> Result<Option<Bytes>, StreamError> {
            if self.blocks.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Bytes::from_static(self.blocks.remove(0))))
            }
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn guard_releases_once_on_drop() {
        let releases = Arc::new(AtomicUsize::new(0));
        {
            let mut guard = ReaderGuard::new(CountingReader {
                blocks: vec![&b"a"[..]],
                releases: Arc::clone(&releases),
            });
            assert_eq!(guard.read().await.unwrap().as_deref(), Some(&b"a"[..]));
            guard.release();
            assert!(guard.is_released());
            assert_eq!(guard.read().await.unwrap(), None);
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn byte_stream_reads_then_ends() {
        let blocks: Vec<Result<&'static [u8], std::io::Error>> = vec![Ok(&b"ab"[..]), Ok(&b"c"[..])];
        let mut reader = ByteStream::new(stream::iter(blocks)).open().await.unwrap();
        assert_eq!(reader.read().await.unwrap(), Some(Bytes::from_static(b"ab")));
        assert_eq!(reader.read().await.unwrap(), Some(Bytes::from_static(b"c")));
        assert_eq!(reader.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn byte_stream_maps_errors_to_upstream() {
        let blocks: Vec<Result<Bytes, std::io::Error>> = vec![Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ))];
        let mut reader = ByteStream::new(stream::iter(blocks));
        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, StreamError::Upstream(_)));
        assert_eq!(err.to_string(), "upstream error: reset by peer");
    }

    #[tokio::test]
    async fn released_byte_stream_reads_nothing() {
        let blocks: Vec<Result<&'static [u8], std::io::Error>> = vec![Ok(&b"ab"[..])];
        let mut reader = ByteStream::new(stream::iter(blocks));
        reader.release();
        assert_eq!(reader.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_body_is_unreadable() {
        let source: Option<ByteStream<stream::Empty<Result<Bytes, std::io::Error>>>> = None;
        let err = source.open().await.err().unwrap();
        assert!(matches!(err, StreamError::UnreadableSource(_)));
    }

    #[tokio::test]
    async fn async_read_source_yields_bytes() {
        let mut reader = AsyncReadSource::new(&b"line one\nline two\n"[..])
            .open()
            .await
            .unwrap();
        let mut collected = Vec::new();
        while let Some(block) = reader.read().await.unwrap() {
            collected.extend_from_slice(&block);
        }
        assert_eq!(collected, b"line one\nline two\n");
    }
}
