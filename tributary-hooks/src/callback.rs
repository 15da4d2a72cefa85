//! Closure-backed hooks.

use async_trait::async_trait;
use tributary_types::{Hook, HookAction, HookContext, HookError, HookPoint};

type DeltaFn = Box<dyn Fn(&str) + Send + Sync>;
type CompletedFn = Box<dyn Fn(&str) + Send + Sync>;
type FailedFn = Box<dyn Fn(&str) + Send + Sync>;

/// A hook built from plain closures, one per point.
///
/// Fires only at the points a closure was set for and always continues.
///
/// ```
/// use std::sync::Arc;
/// use tributary_hooks::{FnHook, HookRegistry};
///
/// let hooks = HookRegistry::new().with(Arc::new(
///     FnHook::new()
///         .on_delta(|delta| print!("{delta}"))
///         .on_completed(|text| println!("\n[{} bytes]", text.len())),
/// ));
/// assert_eq!(hooks.len(), 1);
/// ```
#[derive(Default)]
pub struct FnHook {
    points: Vec<HookPoint>,
    delta_fn: Option<DeltaFn>,
    completed_fn: Option<CompletedFn>,
    failed_fn: Option<FailedFn>,
}

impl FnHook {
    /// A hook with no closures; it fires nowhere until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with each delta.
    pub fn on_delta<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.delta_fn = Some(Box::new(f));
        self.fire_at(HookPoint::Delta)
    }

    /// Called once with the full text of a completed run.
    pub fn on_completed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.completed_fn = Some(Box::new(f));
        self.fire_at(HookPoint::Completed)
    }

    /// Called once with the error message of a failed run.
    pub fn on_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.failed_fn = Some(Box::new(f));
        self.fire_at(HookPoint::Failed)
    }

    fn fire_at(mut self, point: HookPoint) -> Self {
        if !self.points.contains(&point) {
            self.points.push(point);
        }
        self
    }
}

#[async_trait]
impl Hook for FnHook {
    fn points(&self) -> &[HookPoint] {
        &self.points
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        match ctx.point {
            HookPoint::Delta => {
                if let (Some(f), Some(delta)) = (&self.delta_fn, ctx.delta.as_deref()) {
                    f(delta);
                }
            }
            HookPoint::Completed => {
                if let (Some(f), Some(text)) = (&self.completed_fn, ctx.text.as_deref()) {
                    f(text);
                }
            }
            HookPoint::Failed => {
                if let (Some(f), Some(error)) = (&self.failed_fn, ctx.error.as_deref()) {
                    f(error);
                }
            }
            _ => {}
        }
        Ok(HookAction::Continue)
    }
}

impl std::fmt::Debug for FnHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHook")
            .field("points", &self.points)
            .finish_non_exhaustive()
    }
}
