//! A hook that records every event and always continues.

use crate::error::HookError;
use crate::hook::{Hook, HookAction, HookContext, HookPoint};
use async_trait::async_trait;
use std::sync::Mutex;

/// A hook that records every context it sees and always returns
/// [`HookAction::Continue`]. Use `.events()` to inspect what was recorded.
pub struct RecordingHook {
    points: Vec<HookPoint>,
    events: Mutex<Vec<HookContext>>,
}

impl RecordingHook {
    /// Create a new RecordingHook that fires at all hook points.
    pub fn new() -> Self {
        Self::at(&HookPoint::ALL)
    }

    /// Create a RecordingHook that fires only at the given points.
    pub fn at(points: &[HookPoint]) -> Self {
        Self {
            points: points.to_vec(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Return a snapshot of all recorded events.
    pub fn events(&self) -> Vec<HookContext> {
        self.events.lock().unwrap().clone()
    }

    /// The deltas seen at the `Delta` point, in order.
    pub fn deltas(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|ctx| ctx.delta)
            .collect()
    }

    /// How many times the given point fired.
    pub fn count(&self, point: HookPoint) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|ctx| ctx.point == point)
            .count()
    }
}

impl Default for RecordingHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Hook for RecordingHook {
    fn points(&self) -> &[HookPoint] {
        &self.points
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        self.events.lock().unwrap().push(ctx.clone());
        Ok(HookAction::Continue)
    }
}

/// A hook that halts the run after a given number of deltas.
pub struct HaltingHook {
    after: usize,
}

impl HaltingHook {
    /// Halt once `after` deltas have been appended.
    pub fn after(after: usize) -> Self {
        Self { after }
    }
}

#[async_trait]
impl Hook for HaltingHook {
    fn points(&self) -> &[HookPoint] {
        &[HookPoint::Delta]
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        if ctx.deltas >= self.after {
            Ok(HookAction::Halt {
                reason: format!("stopped after {} deltas", ctx.deltas),
            })
        } else {
            Ok(HookAction::Continue)
        }
    }
}
