//! Completion sinks: where a finished response goes.

use async_trait::async_trait;
use std::sync::Mutex;
use tributary_types::{Hook, HookAction, HookContext, HookError, HookPoint};

/// Receives the full text of each completed run, exactly once per run.
///
/// Partial text is never handed to a sink; a failed run produces nothing.
/// Implement this over a message store to persist assistant replies.
#[async_trait]
pub trait CompletionSink: Send + Sync {
    /// Persist the completed response text.
    async fn persist(&self, text: &str) -> Result<(), HookError>;
}

/// A [`Hook`] that forwards completed text to a [`CompletionSink`].
///
/// Fires only at [`HookPoint::Completed`]. A sink error is returned as a
/// hook error, which the registry logs; the run still completes.
pub struct SinkHook<S> {
    sink: S,
}

impl<S: CompletionSink> SinkHook<S> {
    /// Wrap a sink.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[async_trait]
impl<S: CompletionSink> Hook for SinkHook<S> {
    fn points(&self) -> &[HookPoint] {
        &[HookPoint::Completed]
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        if let Some(text) = ctx.text.as_deref() {
            self.sink.persist(text).await?;
        }
        Ok(HookAction::Continue)
    }
}

/// A sink that keeps every persisted response in memory.
#[derive(Default)]
pub struct InMemorySink {
    records: Mutex<Vec<String>>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every persisted response, oldest first.
    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionSink for InMemorySink {
    async fn persist(&self, text: &str) -> Result<(), HookError> {
        self.records
            .lock()
            .map_err(|e| HookError::Failed(format!("sink poisoned: {e}")))?
            .push(text.to_owned());
        Ok(())
    }
}

#[async_trait]
impl<S: CompletionSink + ?Sized> CompletionSink for std::sync::Arc<S> {
    async fn persist(&self, text: &str) -> Result<(), HookError> {
        (**self).persist(text).await
    }
}
