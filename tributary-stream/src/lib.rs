//! # tributary-stream : normalize streamed completions into text
//!
//! A run turns one streamed completion into one string. Two inputs are
//! accepted:
//!
//! - **push**: a stream of already-decoded fragments ([`PushProducer`])
//! - **pull**: raw bytes plus a declared [`StreamFormat`] ([`PullProducer`])
//!
//! Pull mode decodes bytes incrementally ([`LineReassembler`]), pulls the
//! text out of each line ([`extract`]) and stops at a termination sentinel.
//! Both modes feed a size-bounded [`ResponseAccumulator`] and a hook
//! pipeline; the [`Orchestrator`] releases the byte source on every exit.
//!
//! ```no_run
//! # async fn demo() -> Result<(), tributary_types::StreamError> {
//! use futures::stream;
//! use std::convert::Infallible;
//! use tributary_stream::{PushProducer, handle_stream};
//! use tributary_types::StreamConfig;
//!
//! let fragments = stream::iter(vec![Ok::<_, Infallible>("Hello"), Ok(" World")]);
//! let text = handle_stream(PushProducer::new(fragments), StreamConfig::default()).await?;
//! assert_eq!(text, "Hello World");
//! # Ok(())
//! # }
//! ```
//!
//! [`StreamFormat`]: tributary_types::StreamFormat

#![deny(missing_docs)]

pub mod accumulator;
pub mod extractor;
pub mod orchestrator;
pub mod parser;
pub mod producer;
pub mod reassembler;
pub mod source;

pub use accumulator::ResponseAccumulator;
pub use extractor::extract;
pub use orchestrator::{DeltaStream, Orchestrator, RunState, StreamEvent, handle_stream};
pub use parser::StreamParser;
pub use producer::{DeltaProducer, PullProducer, PushProducer, Step};
pub use reassembler::LineReassembler;
pub use source::{AsyncReadSource, ByteReader, ByteSource, ByteStream, ReaderGuard, ResponseBody};
