//! # tributary-types : protocol types for streamed completions
//!
//! This crate defines the vocabulary shared by every tributary crate. It
//! contains no runtime logic: decoding, extraction and orchestration live in
//! `tributary-stream`, hook composition in `tributary-hooks`.
//!
//! | Concern | Types |
//! |---------|-------|
//! | Wire convention | [`StreamFormat`], [`Backend`] |
//! | Extraction result | [`Extracted`] |
//! | Run result | [`StreamOutcome`] |
//! | Failure | [`StreamError`], [`HookError`] |
//! | Observation | [`Hook`], [`HookPoint`], [`HookContext`], [`HookAction`] |
//! | Defaults | [`StreamConfig`] |
//!
//! Hooks use `async-trait` so they can be stored as `Arc<dyn Hook>` and
//! composed at runtime.

#![deny(missing_docs)]

pub mod backend;
pub mod config;
pub mod error;
pub mod format;
pub mod hook;
pub mod outcome;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use backend::Backend;
pub use config::{DEFAULT_MAX_BUFFER_BYTES, StreamConfig};
pub use error::{HookError, StreamError};
pub use format::{Extracted, StreamFormat};
pub use hook::{Hook, HookAction, HookContext, HookPoint};
pub use outcome::StreamOutcome;
