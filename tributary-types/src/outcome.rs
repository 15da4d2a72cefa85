//! The terminal result of a run.

use crate::error::StreamError;

/// How a run ended. Exactly one per run.
#[derive(Debug)]
pub enum StreamOutcome {
    /// The stream ended normally; carries the full accumulated text.
    Completed(String),
    /// The stream failed; no completion hook fired and nothing should be
    /// persisted.
    Failed(StreamError),
}

impl StreamOutcome {
    /// Whether the run completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, StreamOutcome::Completed(_))
    }

    /// The full text, if completed.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamOutcome::Completed(text) => Some(text),
            StreamOutcome::Failed(_) => None,
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<String, StreamError> {
        self.into()
    }
}

impl From<Result<String, StreamError>> for StreamOutcome {
    fn from(result: Result<String, StreamError>) -> Self {
        match result {
            Ok(text) => StreamOutcome::Completed(text),
            Err(err) => StreamOutcome::Failed(err),
        }
    }
}

impl From<StreamOutcome> for Result<String, StreamError> {
    fn from(outcome: StreamOutcome) -> Self {
        match outcome {
            StreamOutcome::Completed(text) => Ok(text),
            StreamOutcome::Failed(err) => Err(err),
        }
    }
}
