//! Bounded response accumulation.

use std::ops::Range;
use tributary_types::{DEFAULT_MAX_BUFFER_BYTES, StreamError};

/// Append-only text buffer with a hard size bound, in UTF-8 bytes.
///
/// A fragment that would push the size past the bound is rejected whole and
/// is NOT stored: after an overflow the buffer still holds exactly the text
/// appended before it, and its size never exceeds the bound. The overflow is
/// sticky; every later `append` fails too until [`clear`](Self::clear).
#[derive(Debug, Clone)]
pub struct ResponseAccumulator {
    fragments: Vec<String>,
    size: usize,
    limit: usize,
    overflowed: bool,
}

impl ResponseAccumulator {
    /// An accumulator bounded at `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            fragments: Vec::new(),
            size: 0,
            limit,
            overflowed: false,
        }
    }

    /// Store `text`, or fail with [`StreamError::Overflow`] if the
    /// cumulative size would exceed the bound.
    pub fn append(&mut self, text: &str) -> Result<(), StreamError> {
        let attempted = self.size.saturating_add(text.len());
        if self.overflowed || attempted > self.limit {
            self.overflowed = true;
            return Err(StreamError::Overflow {
                limit: self.limit,
                attempted,
            });
        }
        self.fragments.push(text.to_owned());
        self.size = attempted;
        Ok(())
    }

    /// The fragments concatenated in append order.
    pub fn to_text(&self) -> String {
        self.fragments.concat()
    }

    /// Current size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The configured bound in bytes.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether an append has overflowed since the last clear.
    pub fn has_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Reset to empty, including a previous overflow.
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.size = 0;
        self.overflowed = false;
    }

    /// Whether nothing has been appended since the last clear.
    ///
    /// An appended empty fragment counts: the buffer is then not empty even
    /// though its size is zero.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The most recently appended fragment.
    pub fn last_fragment(&self) -> Option<&str> {
        self.fragments.last().map(String::as_str)
    }

    /// Every appended fragment, in order.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// A byte range of the accumulated text, or `None` if the range is out
    /// of bounds or splits a character.
    pub fn slice(&self, range: Range<usize>) -> Option<String> {
        self.to_text().get(range).map(str::to_owned)
    }
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER_BYTES)
    }
}
