//! Concrete [`Hook`] using the [`tracing`] crate.

use async_trait::async_trait;
use tributary_types::{Hook, HookAction, HookContext, HookError, HookPoint};

/// A [`Hook`] that emits structured [`tracing`] events.
///
/// Always returns [`HookAction::Continue`].
/// Delta text is never logged, only its length.
///
/// | Point | Event | Level |
/// |-------|-------|-------|
/// | `Delta` | `tributary.stream.delta` | `TRACE` |
/// | `Completed` | `tributary.stream.completed` | `DEBUG` |
/// | `Failed` | `tributary.stream.failed` | `WARN` |
pub struct TracingHook;

impl TracingHook {
    /// Create a new `TracingHook`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for TracingHook {
    fn points(&self) -> &[HookPoint] {
        &HookPoint::ALL
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        match ctx.point {
            HookPoint::Delta => {
                tracing::trace!(
                    len = ctx.delta.as_deref().map_or(0, str::len),
                    deltas = ctx.deltas,
                    bytes = ctx.bytes,
                    "tributary.stream.delta"
                );
            }
            HookPoint::Completed => {
                tracing::debug!(
                    deltas = ctx.deltas,
                    bytes = ctx.bytes,
                    "tributary.stream.completed"
                );
            }
            HookPoint::Failed => {
                tracing::warn!(
                    deltas = ctx.deltas,
                    bytes = ctx.bytes,
                    error = ctx.error.as_deref().unwrap_or_default(),
                    "tributary.stream.failed"
                );
            }
            _ => {}
        }
        Ok(HookAction::Continue)
    }
}
