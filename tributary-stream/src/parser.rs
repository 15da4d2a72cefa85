//! Incremental parsing of already-decoded text.

use crate::extractor::extract;
use crate::reassembler::LineReassembler;
use tributary_types::{Extracted, StreamFormat};

/// Line reassembly plus extraction for callers that hold decoded text
/// rather than a byte source.
///
/// Once a termination sentinel is seen the parser ignores further input
/// until [`reset`](Self::reset).
#[derive(Debug)]
pub struct StreamParser {
    format: StreamFormat,
    lines: LineReassembler,
    terminated: bool,
}

impl StreamParser {
    /// A parser for `format`.
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            lines: LineReassembler::new(),
            terminated: false,
        }
    }

    /// The declared format.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Feed text; returns the non-empty deltas of every line it completed.
    pub fn parse(&mut self, text: &str) -> Vec<String> {
        if self.terminated {
            return Vec::new();
        }
        let lines = self.lines.feed_str(text);
        self.extract_all(lines)
    }

    /// Extract the retained tail, if any. The parser is empty afterwards.
    pub fn flush(&mut self) -> Option<String> {
        if self.terminated {
            return None;
        }
        let tail = self.lines.finish()?;
        self.extract_all([tail]).into_iter().next()
    }

    /// Whether a termination sentinel has been seen.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Forget the retained tail and any termination.
    pub fn reset(&mut self) {
        self.lines.reset();
        self.terminated = false;
    }

    fn extract_all(&mut self, lines: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut deltas = Vec::new();
        for line in lines {
            match extract(self.format, &line) {
                Some(Extracted::Delta(text)) if !text.is_empty() => deltas.push(text),
                Some(Extracted::Termination) => {
                    self.terminated = true;
                    break;
                }
                _ => {}
            }
        }
        deltas
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new(StreamFormat::default())
    }
}
