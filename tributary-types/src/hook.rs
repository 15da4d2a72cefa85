//! The hook interface for observing one stream run.

use crate::error::HookError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where in a run a hook fires.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// After a non-empty delta was appended to the response.
    Delta,
    /// Once, when the run completed. Carries the full text.
    Completed,
    /// Once, when the run failed. Carries the error message.
    Failed,
}

impl HookPoint {
    /// Every hook point, in firing order.
    pub const ALL: [HookPoint; 3] = [HookPoint::Delta, HookPoint::Completed, HookPoint::Failed];
}

/// What a hook sees at its firing point.
/// Read-only: hooks observe and decide, they never mutate the run.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookContext {
    /// Current hook point.
    pub point: HookPoint,
    /// The delta just appended (only at `Delta`).
    pub delta: Option<String>,
    /// The full response text (only at `Completed`).
    pub text: Option<String>,
    /// The failure message (only at `Failed`).
    pub error: Option<String>,
    /// Number of deltas appended so far, including this one.
    pub deltas: usize,
    /// Accumulated response size in bytes.
    pub bytes: usize,
}

impl HookContext {
    /// Create a new HookContext with only the hook point set.
    pub fn new(point: HookPoint) -> Self {
        Self {
            point,
            delta: None,
            text: None,
            error: None,
            deltas: 0,
            bytes: 0,
        }
    }

    /// Context for the `Delta` point.
    pub fn delta(delta: impl Into<String>, deltas: usize, bytes: usize) -> Self {
        Self {
            delta: Some(delta.into()),
            deltas,
            bytes,
            ..Self::new(HookPoint::Delta)
        }
    }

    /// Context for the `Completed` point.
    pub fn completed(text: impl Into<String>, deltas: usize) -> Self {
        let text = text.into();
        Self {
            bytes: text.len(),
            text: Some(text),
            deltas,
            ..Self::new(HookPoint::Completed)
        }
    }

    /// Context for the `Failed` point.
    pub fn failed(error: impl Into<String>, deltas: usize, bytes: usize) -> Self {
        Self {
            error: Some(error.into()),
            deltas,
            bytes,
            ..Self::new(HookPoint::Failed)
        }
    }
}

/// What a hook decides to do.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HookAction {
    /// Continue normally.
    Continue,
    /// Stop the run. Only honored at the `Delta` point; the run fails
    /// with `StreamError::Halted`.
    Halt {
        /// Reason for halting.
        reason: String,
    },
}

/// A hook that observes a stream run.
///
/// Hooks are registered on the orchestrator and called in registration
/// order. For one run they never execute concurrently, and `Delta` events
/// arrive in the order the bytes did.
///
/// Hook handlers SHOULD complete quickly: the run does not read the next
/// block from its source until every hook for the current delta returned.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Which points this hook fires at.
    fn points(&self) -> &[HookPoint];

    /// Called at each registered hook point.
    /// Returning an error does NOT fail the run; it is logged and the run
    /// continues. Use [`HookAction::Halt`] to stop.
    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError>;
}
