//! Error types for stream runs and hooks.

use thiserror::Error;

/// Why a stream run failed.
///
/// Every variant is terminal for the run that produced it. Nothing in
/// tributary retries; retry and backoff belong to whoever issued the
/// upstream request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StreamError {
    /// The accumulated response would exceed the configured bound.
    #[error("buffer exceeded maximum size of {limit} bytes (attempted {attempted})")]
    Overflow {
        /// The configured bound, in bytes.
        limit: usize,
        /// The size the buffer would have reached, in bytes.
        attempted: usize,
    },

    /// The byte source could not be opened or read at all.
    #[error("source is not readable: {0}")]
    UnreadableSource(String),

    /// The producer itself reported a failure (network, backend).
    /// Carried unchanged.
    #[error("upstream error: {0}")]
    Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A hook asked the run to stop.
    #[error("halted by hook: {0}")]
    Halted(String),

    /// The run's cancellation token fired.
    #[error("cancelled")]
    Cancelled,

    /// Catch-all for failures inside the pipeline itself.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl StreamError {
    /// Wrap any producer error as [`StreamError::Upstream`].
    pub fn upstream(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StreamError::Upstream(err.into())
    }

    /// Whether this is an accumulator overflow.
    pub fn is_overflow(&self) -> bool {
        matches!(self, StreamError::Overflow { .. })
    }

    /// Always `false`: a failed run is reported once and never retried here.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Hook errors. These are logged but do NOT fail the run
/// (use `HookAction::Halt` to stop it).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook execution failed.
    #[error("hook failed: {0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
