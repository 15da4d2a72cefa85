//! Drives one run: producer to accumulator to hooks, with release on every
//! exit path.

use crate::accumulator::ResponseAccumulator;
use crate::producer::{DeltaProducer, PullProducer, Step};
use crate::source::ByteSource;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio_util::sync::CancellationToken;
use tributary_hooks::HookRegistry;
use tributary_types::{
    Hook, HookAction, HookContext, StreamConfig, StreamError, StreamOutcome,
};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Configured, not yet polled.
    Idle,
    /// Deltas may still arrive.
    Running,
    /// Ended normally. Terminal.
    Completed,
    /// Ended with an error. Terminal.
    Failed,
}

impl RunState {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// What a run yields, in order: zero or more `Delta`s, then exactly one of
/// `Completed` or `Failed`.
#[derive(Debug)]
pub enum StreamEvent {
    /// A non-empty delta, already appended to the response.
    Delta(String),
    /// The run completed with this full text.
    Completed(String),
    /// The run failed.
    Failed(StreamError),
}

/// Configures and starts runs.
///
/// ```no_run
/// # async fn demo(response: reqwest::Response) -> Result<(), tributary_types::StreamError> {
/// use std::sync::Arc;
/// use tributary_hooks::TracingHook;
/// use tributary_stream::{Orchestrator, PullProducer};
/// use tributary_types::{Backend, StreamConfig};
///
/// let text = Orchestrator::new(StreamConfig::default())
///     .with_hook(Arc::new(TracingHook::new()))
///     .run(PullProducer::for_backend(response, Backend::Ollama))
///     .await?;
/// # let _ = text;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: StreamConfig,
    hooks: HookRegistry,
    cancel: Option<CancellationToken>,
}

impl Orchestrator {
    /// An orchestrator with no hooks.
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            hooks: HookRegistry::new(),
            cancel: None,
        }
    }

    /// Register a hook after the ones already registered.
    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.add(hook);
        self
    }

    /// Replace the hook pipeline.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    /// Fail runs with [`StreamError::Cancelled`] once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The configuration runs use.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// The registered hooks.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// A pull producer over `source` in the configured default format.
    pub fn pull<B: ByteSource>(&self, source: B) -> PullProducer<B> {
        PullProducer::new(source, self.config.format)
    }

    /// Start a run and return its events.
    ///
    /// Nothing is read until the stream is polled. Dropping the stream
    /// before its terminal event releases the producer and fires no
    /// terminal hook.
    pub fn stream<P>(self, producer: P) -> DeltaStream
    where
        P: DeltaProducer + 'static,
    {
        let Orchestrator {
            config,
            hooks,
            cancel,
        } = self;

        let events = async_stream::stream! {
            let mut producer = producer;
            producer.limit_buffer(config.max_buffer_bytes);
            let mut response = ResponseAccumulator::new(config.max_buffer_bytes);
            let mut count = 0usize;
            tracing::debug!(limit = config.max_buffer_bytes, "tributary.stream.start");

            let failure = 'run: loop {
                let step = match next_step(&mut producer, cancel.as_ref()).await {
                    Ok(step) => step,
                    Err(e) => break 'run Some(e),
                };
                let deltas = match step {
                    Step::Deltas(deltas) => deltas,
                    Step::End => break 'run None,
                };
                for delta in deltas {
                    if delta.is_empty() {
                        continue;
                    }
                    if let Err(e) = response.append(&delta) {
                        break 'run Some(e);
                    }
                    count += 1;
                    let ctx = HookContext::delta(delta.as_str(), count, response.size());
                    if let HookAction::Halt { reason } = hooks.dispatch(&ctx).await {
                        break 'run Some(StreamError::Halted(reason));
                    }
                    tracing::trace!(len = delta.len(), deltas = count, "tributary.stream.delta");
                    yield StreamEvent::Delta(delta);
                }
            };
            producer.close();

            match failure {
                None => {
                    let text = response.to_text();
                    tracing::debug!(deltas = count, bytes = text.len(), "tributary.stream.completed");
                    hooks.dispatch(&HookContext::completed(text.as_str(), count)).await;
                    yield StreamEvent::Completed(text);
                }
                Some(error) => {
                    tracing::warn!(deltas = count, error = %error, "tributary.stream.failed");
                    let ctx = HookContext::failed(error.to_string(), count, response.size());
                    hooks.dispatch(&ctx).await;
                    yield StreamEvent::Failed(error);
                }
            }
        };

        DeltaStream {
            events: Box::pin(events),
            state: RunState::Idle,
        }
    }

    /// Run to the end and return the full text.
    pub async fn run<P>(self, producer: P) -> Result<String, StreamError>
    where
        P: DeltaProducer + 'static,
    {
        self.stream(producer).outcome().await.into_result()
    }
}

async fn next_step<P: DeltaProducer>(
    producer: &mut P,
    cancel: Option<&CancellationToken>,
) -> Result<Step, StreamError> {
    let Some(token) = cancel else {
        return producer.next_step().await;
    };
    if token.is_cancelled() {
        return Err(StreamError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(StreamError::Cancelled),
        step = producer.next_step() => step,
    }
}

/// The events of one run.
///
/// Implements [`Stream`]; use [`outcome`](Self::outcome) to skip the deltas
/// and wait for the end.
pub struct DeltaStream {
    events: Pin<Box<dyn Stream<Item = StreamEvent> + Send>>,
    state: RunState,
}

impl DeltaStream {
    /// Where the run is, as of the last event polled.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drain the run and return how it ended.
    pub async fn outcome(mut self) -> StreamOutcome {
        while let Some(event) = self.next().await {
            match event {
                StreamEvent::Delta(_) => {}
                StreamEvent::Completed(text) => return StreamOutcome::Completed(text),
                StreamEvent::Failed(error) => return StreamOutcome::Failed(error),
            }
        }
        StreamOutcome::Failed(StreamError::Other(
            "run ended without an outcome".into(),
        ))
    }
}

impl Stream for DeltaStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamEvent>> {
        match self.state {
            RunState::Idle => self.state = RunState::Running,
            RunState::Running => {}
            RunState::Completed | RunState::Failed => return Poll::Ready(None),
        }
        let polled = self.events.as_mut().poll_next(cx);
        match &polled {
            Poll::Ready(Some(StreamEvent::Completed(_))) => self.state = RunState::Completed,
            Poll::Ready(Some(StreamEvent::Failed(_))) => self.state = RunState::Failed,
            _ => {}
        }
        polled
    }
}

impl std::fmt::Debug for DeltaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaStream")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Run `producer` with `config` and no hooks.
pub async fn handle_stream<P>(producer: P, config: StreamConfig) -> Result<String, StreamError>
where
    P: DeltaProducer + 'static,
{
    Orchestrator::new(config).run(producer).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::PushProducer;
    use crate::source::ByteStream;
    use bytes::Bytes;
    use futures::stream;
    use std::convert::Infallible;
    use tributary_types::test_utils::{HaltingHook, RecordingHook};
    use tributary_types::{HookPoint, StreamFormat};

    type Fragments = stream::Iter<std::vec::IntoIter<Result<&'static str, Infallible>>>;

    fn fragments(parts: &[&'static str]) -> PushProducer<Fragments> {
        let parts: Vec<Result<&'static str, Infallible>> = parts.iter().map(|p| Ok(*p)).collect();
        PushProducer::new(stream::iter(parts))
    }

    #[tokio::test]
    async fn push_run_concatenates() {
        let text = Orchestrator::default()
            .run(fragments(&["Hello", " ", "World"]))
            .await
            .unwrap();
        assert_eq!(text, "Hello World");
    }

    #[tokio::test]
    async fn events_then_terminal() {
        let mut events = Orchestrator::default().stream(fragments(&["a", "", "b"]));
        assert_eq!(events.state(), RunState::Idle);
        let mut deltas = Vec::new();
        let mut completed = None;
        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Delta(d) => deltas.push(d),
                StreamEvent::Completed(text) => completed = Some(text),
                StreamEvent::Failed(e) => panic!("unexpected failure: {e}"),
            }
        }
        assert_eq!(deltas, vec!["a", "b"]);
        assert_eq!(completed.as_deref(), Some("ab"));
        assert_eq!(events.state(), RunState::Completed);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn hooks_see_deltas_then_completion() {
        let recorder = Arc::new(RecordingHook::new());
        let text = Orchestrator::default()
            .with_hook(recorder.clone())
            .run(fragments(&["x", "y"]))
            .await
            .unwrap();
        assert_eq!(text, "xy");
        assert_eq!(recorder.deltas(), vec!["x", "y"]);
        assert_eq!(recorder.count(HookPoint::Completed), 1);
        assert_eq!(recorder.count(HookPoint::Failed), 0);
        let events = recorder.events();
        assert_eq!(events.last().and_then(|e| e.text.as_deref()), Some("xy"));
    }

    #[tokio::test]
    async fn overflow_fails_the_run() {
        let recorder = Arc::new(RecordingHook::new());
        let err = Orchestrator::new(StreamConfig::default().with_max_buffer_bytes(4))
            .with_hook(recorder.clone())
            .run(fragments(&["abc", "de", "f"]))
            .await
            .unwrap_err();
        assert!(err.is_overflow());
        assert_eq!(recorder.deltas(), vec!["abc"]);
        assert_eq!(recorder.count(HookPoint::Completed), 0);
        assert_eq!(recorder.count(HookPoint::Failed), 1);
    }

    #[tokio::test]
    async fn halt_fails_with_reason() {
        let recorder = Arc::new(RecordingHook::new());
        let err = Orchestrator::default()
            .with_hook(Arc::new(HaltingHook::after(2)))
            .with_hook(recorder.clone())
            .run(fragments(&["1", "2", "3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Halted(ref r) if r == "stopped after 2 deltas"));
        assert_eq!(recorder.deltas(), vec!["1"], "halt short-circuits later hooks");
        assert_eq!(recorder.count(HookPoint::Failed), 1);
    }

    #[tokio::test]
    async fn pull_uses_configured_format() {
        let blocks: Vec<Result<Bytes, Infallible>> = vec![
            Ok(Bytes::from_static(b"data: {\"text\":\"Hel")),
            Ok(Bytes::from_static(b"lo\"}\n\ndata: [DONE]\n")),
        ];
        let orchestrator =
            Orchestrator::new(StreamConfig::default().with_format(StreamFormat::Sse));
        let producer = orchestrator.pull(ByteStream::new(stream::iter(blocks)));
        assert_eq!(orchestrator.run(producer).await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = Orchestrator::default()
            .with_cancellation(token)
            .stream(fragments(&["never"]))
            .outcome()
            .await;
        assert!(matches!(outcome, StreamOutcome::Failed(StreamError::Cancelled)));
    }

    #[tokio::test]
    async fn cancelled_while_waiting() {
        let token = CancellationToken::new();
        let mut events = Orchestrator::default()
            .with_cancellation(token.clone())
            .stream(PushProducer::new(
                stream::iter(vec![Ok::<_, Infallible>("first")]).chain(stream::pending()),
            ));
        assert!(matches!(events.next().await, Some(StreamEvent::Delta(ref d)) if d == "first"));
        token.cancel();
        assert!(matches!(
            events.next().await,
            Some(StreamEvent::Failed(StreamError::Cancelled))
        ));
        assert_eq!(events.state(), RunState::Failed);
    }

    #[tokio::test]
    async fn handle_stream_without_hooks() {
        let text = handle_stream(fragments(&["ok"]), StreamConfig::default())
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }

    #[test]
    fn run_state_terminality() {
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
    }
}
