#![deny(missing_docs)]
//! Hook registry and stock hooks for tributary.
//!
//! The [`HookRegistry`] collects multiple [`Hook`] implementations into
//! an ordered pipeline. At each hook point, hooks are dispatched in
//! registration order. The pipeline short-circuits on `Halt`; subsequent
//! hooks are not called. Hook errors are logged and the pipeline continues.
//!
//! Stock hooks:
//! - [`TracingHook`] emits one structured `tracing` event per hook point.
//! - [`SinkHook`] hands the completed text to a [`CompletionSink`], the
//!   seam where a message store plugs in.
//! - [`FnHook`] adapts plain closures.

mod callback;
mod sink;
mod tracing_hook;

pub use callback::FnHook;
pub use sink::{CompletionSink, InMemorySink, SinkHook};
pub use tracing_hook::TracingHook;

use std::sync::Arc;
use tributary_types::{Hook, HookAction, HookContext};

/// A registry that dispatches hook events to an ordered pipeline of hooks.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookRegistry {
    /// Create a new empty hook registry.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Add a hook to the end of the pipeline.
    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.push(hook);
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, hook: Arc<dyn Hook>) -> Self {
        self.add(hook);
        self
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Dispatch a hook event through the pipeline.
    ///
    /// Returns `Continue` if every hook continued, otherwise the first
    /// `Halt`. Hook errors are logged and treated as `Continue`.
    pub async fn dispatch(&self, ctx: &HookContext) -> HookAction {
        for hook in &self.hooks {
            if !hook.points().contains(&ctx.point) {
                continue;
            }

            match hook.on_event(ctx).await {
                Ok(HookAction::Continue) => {}
                Ok(action) => {
                    tracing::debug!(point = ?ctx.point, ?action, "hook short-circuited dispatch");
                    return action;
                }
                Err(e) => {
                    tracing::warn!(point = ?ctx.point, error = %e, "hook failed; continuing");
                }
            }
        }

        HookAction::Continue
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
