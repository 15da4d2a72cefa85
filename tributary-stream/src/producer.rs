//! The two input capabilities an orchestrator can drive.
//!
//! Push mode hands over fragments that were already extracted upstream;
//! pull mode hands over raw bytes and leaves decoding and extraction to this
//! crate. Both implement [`DeltaProducer`], so the orchestrator's
//! accumulation, hook and finalization logic exists once.

use crate::extractor::extract;
use crate::reassembler::LineReassembler;
use crate::source::{ByteSource, ReaderGuard};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use tributary_types::{Backend, DEFAULT_MAX_BUFFER_BYTES, Extracted, StreamError, StreamFormat};

/// One step of a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deltas, in arrival order. May be empty (a read that completed no line).
    Deltas(Vec<String>),
    /// The producer is exhausted or terminated; nothing follows.
    End,
}

/// A source of deltas for one run.
pub trait DeltaProducer: Send {
    /// Advance by one read.
    fn next_step(&mut self) -> impl Future<Output = Result<Step, StreamError>> + Send;

    /// Bound what the producer may hold back between steps, in bytes.
    /// The orchestrator passes its configured buffer bound before the first
    /// step.
    fn limit_buffer(&mut self, _max_bytes: usize) {}

    /// Release whatever the producer holds. Called once when the run ends,
    /// whichever way it ends. Dropping the producer releases it too.
    fn close(&mut self) {}
}

/// Push mode: a stream of already-decoded text fragments.
pub struct PushProducer<S> {
    fragments: Option<Pin<Box<S>>>,
}

impl<S> PushProducer<S> {
    /// Wrap a fragment stream.
    pub fn new(fragments: S) -> Self {
        Self {
            fragments: Some(Box::pin(fragments)),
        }
    }
}

impl<S, T, E> DeltaProducer for PushProducer<S>
where
    S: Stream<Item = Result<T, E>> + Send,
    T: Into<String>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    async fn next_step(&mut self) -> Result<Step, StreamError> {
        let Some(fragments) = self.fragments.as_mut() else {
            return Ok(Step::End);
        };
        match fragments.next().await {
            Some(Ok(fragment)) => Ok(Step::Deltas(vec![fragment.into()])),
            Some(Err(e)) => Err(StreamError::Upstream(e.into())),
            None => Ok(Step::End),
        }
    }

    fn close(&mut self) {
        self.fragments = None;
    }
}

/// Pull mode: a byte source decoded with a declared [`StreamFormat`].
///
/// The source is opened on the first step, so an unreadable source fails
/// the run like any other error. The partial line held back between reads
/// is bounded: once it exceeds the limit the step fails with
/// [`StreamError::Overflow`] and the source is released.
pub struct PullProducer<B: ByteSource> {
    format: StreamFormat,
    source: Option<B>,
    reader: Option<ReaderGuard<B::Reader>>,
    lines: LineReassembler,
    max_line_bytes: usize,
    done: bool,
}

impl<B: ByteSource> PullProducer<B> {
    /// Decode `source` as `format`.
    pub fn new(source: B, format: StreamFormat) -> Self {
        Self {
            format,
            source: Some(source),
            reader: None,
            lines: LineReassembler::new(),
            max_line_bytes: DEFAULT_MAX_BUFFER_BYTES,
            done: false,
        }
    }

    /// Bound the partial line held back between reads.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Decode `source` with the format `backend` streams.
    pub fn for_backend(source: B, backend: Backend) -> Self {
        Self::new(source, backend.stream_format())
    }

    /// The declared format.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    fn extract_lines(&mut self, lines: Vec<String>) -> Vec<String> {
        let mut deltas = Vec::with_capacity(lines.len());
        for line in lines {
            match extract(self.format, &line) {
                Some(Extracted::Delta(text)) => deltas.push(text),
                Some(Extracted::Termination) => {
                    tracing::trace!(format = %self.format, "termination sentinel");
                    self.done = true;
                    self.close();
                    break;
                }
                None => {}
            }
        }
        deltas
    }
}

impl<B: ByteSource> DeltaProducer for PullProducer<B> {
    async fn next_step(&mut self) -> Result<Step, StreamError> {
        if self.done {
            return Ok(Step::End);
        }
        if self.reader.is_none() {
            let Some(source) = self.source.take() else {
                self.done = true;
                return Ok(Step::End);
            };
            self.reader = Some(ReaderGuard::new(source.open().await?));
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(Step::End);
        };

        let lines = match reader.read().await? {
            Some(block) => {
                let lines = self.lines.feed(&block);
                let held = self.lines.tail().len();
                if held > self.max_line_bytes {
                    self.done = true;
                    self.close();
                    self.lines.reset();
                    return Err(StreamError::Overflow {
                        limit: self.max_line_bytes,
                        attempted: held,
                    });
                }
                lines
            }
            None => {
                self.done = true;
                self.close();
                self.lines.finish().into_iter().collect()
            }
        };
        Ok(Step::Deltas(self.extract_lines(lines)))
    }

    fn limit_buffer(&mut self, max_bytes: usize) {
        self.max_line_bytes = max_bytes;
    }

    fn close(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.release();
        }
        self.source = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ByteStream;
    use bytes::Bytes;
    use futures::stream;
    use std::convert::Infallible;

    fn bytes(blocks: &[&'static str]) -> ByteStream<stream::Iter<std::vec::IntoIter<Result<Bytes, Infallible>>>> {
        let blocks: Vec<Result<Bytes, Infallible>> = blocks
            .iter()
            .map(|b| Ok(Bytes::from_static(b.as_bytes())))
            .collect();
        ByteStream::new(stream::iter(blocks))
    }

    async fn drain(producer: &mut impl DeltaProducer) -> Vec<Step> {
        let mut steps = Vec::new();
        loop {
            let step = producer.next_step().await.unwrap();
            let end = step == Step::End;
            steps.push(step);
            if end {
                return steps;
            }
        }
    }

    #[tokio::test]
    async fn push_yields_each_fragment() {
        let mut producer = PushProducer::new(stream::iter(vec![
            Ok::<_, Infallible>("a"),
            Ok("b"),
        ]));
        assert_eq!(
            drain(&mut producer).await,
            vec![
                Step::Deltas(vec!["a".into()]),
                Step::Deltas(vec!["b".into()]),
                Step::End
            ]
        );
    }

    #[tokio::test]
    async fn push_closed_yields_end() {
        let mut producer = PushProducer::new(stream::iter(vec![Ok::<_, Infallible>("a")]));
        producer.close();
        assert_eq!(producer.next_step().await.unwrap(), Step::End);
    }

    #[tokio::test]
    async fn pull_flushes_tail_once() {
        let mut producer = PullProducer::new(
            bytes(&["{\"response\":\"a\"}\n{\"resp", "onse\":\"b\"}"]),
            StreamFormat::JsonLines,
        );
        assert_eq!(
            drain(&mut producer).await,
            vec![
                Step::Deltas(vec!["a".into()]),
                Step::Deltas(vec![]),
                Step::Deltas(vec!["b".into()]),
                Step::End
            ]
        );
        assert_eq!(producer.next_step().await.unwrap(), Step::End);
    }

    #[tokio::test]
    async fn pull_unterminated_line_overflows() {
        let mut producer = PullProducer::new(
            bytes(&["{\"response\":\"a\"}\n{\"resp", "onse\":\"a long line that never ends"]),
            StreamFormat::JsonLines,
        )
        .with_max_line_bytes(16);
        assert_eq!(
            producer.next_step().await.unwrap(),
            Step::Deltas(vec!["a".into()])
        );
        let err = producer.next_step().await.unwrap_err();
        assert!(matches!(err, StreamError::Overflow { limit: 16, .. }));
        assert_eq!(producer.next_step().await.unwrap(), Step::End);
    }

    #[tokio::test]
    async fn pull_complete_lines_longer_than_limit_pass() {
        // Only the retained tail is bounded; complete lines are handed on.
        let mut producer = PullProducer::new(
            bytes(&["{\"response\":\"hello there\"}\n"]),
            StreamFormat::JsonLines,
        );
        producer.limit_buffer(8);
        assert_eq!(
            drain(&mut producer).await,
            vec![Step::Deltas(vec!["hello there".into()]), Step::Deltas(vec![]), Step::End]
        );
    }

    #[tokio::test]
    async fn pull_stops_at_termination() {
        let mut producer = PullProducer::new(
            bytes(&["data: x\ndata: [DONE]\ndata: y\n", "data: z\n"]),
            StreamFormat::Sse,
        );
        assert_eq!(
            drain(&mut producer).await,
            vec![Step::Deltas(vec!["x".into()]), Step::End]
        );
    }

    #[tokio::test]
    async fn pull_backend_picks_format() {
        let producer = PullProducer::for_backend(bytes(&[]), Backend::Gemini);
        assert_eq!(producer.format(), StreamFormat::JsonLines);
    }
}
