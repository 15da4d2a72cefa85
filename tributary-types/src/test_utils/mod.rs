//! In-memory hook implementations for testing.
//!
//! Available behind the `test-utils` feature flag.

mod recording_hook;

pub use recording_hook::{HaltingHook, RecordingHook};
