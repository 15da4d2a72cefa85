//! Byte-to-line reassembly.
//!
//! Network reads split a body at arbitrary points: mid-line, and for UTF-8
//! text also mid-character. [`LineReassembler`] turns those reads into whole
//! lines, holding back the incomplete tail (and any incomplete multi-byte
//! sequence) until the next feed completes it.

/// Reassembles arbitrarily split byte blocks into complete lines.
///
/// Lines are split on `\n` only; a `\r` before it stays part of the line.
/// Invalid UTF-8 decodes to U+FFFD, as a lossy decoder would, but a sequence
/// that is merely cut short by the end of a block is kept until the next
/// [`feed`](Self::feed).
///
/// For any partition of a byte stream into feeds, the concatenation of every
/// returned line plus [`finish`](Self::finish) is the same.
#[derive(Debug, Default)]
pub struct LineReassembler {
    /// Undecoded bytes: an incomplete UTF-8 sequence from the last feed.
    pending: Vec<u8>,
    /// Decoded text after the last newline.
    tail: String,
}

impl LineReassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one block of bytes and return every line it completed, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.decode(bytes);
        self.take_lines()
    }

    /// Feed already-decoded text and return every line it completed.
    pub fn feed_str(&mut self, text: &str) -> Vec<String> {
        if !self.pending.is_empty() {
            self.flush_pending();
        }
        self.tail.push_str(text);
        self.take_lines()
    }

    /// End of stream: return the retained tail if it holds anything but
    /// whitespace. The reassembler is empty afterwards.
    pub fn finish(&mut self) -> Option<String> {
        self.flush_pending();
        let tail = std::mem::take(&mut self.tail);
        if tail.trim().is_empty() {
            None
        } else {
            Some(tail)
        }
    }

    /// Drop any retained bytes and text.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.tail.clear();
    }

    /// The decoded text held back since the last newline.
    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Whether nothing is held back.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.tail.is_empty()
    }

    fn decode(&mut self, bytes: &[u8]) {
        let buf = if self.pending.is_empty() {
            std::borrow::Cow::Borrowed(bytes)
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(bytes);
            std::borrow::Cow::Owned(joined)
        };

        let mut input: &[u8] = &buf;
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.tail.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    self.tail.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            self.tail.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            // Cut short by the end of the block.
                            self.pending = rest.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn flush_pending(&mut self) {
        if !self.pending.is_empty() {
            let pending = std::mem::take(&mut self.pending);
            self.tail.push_str(&String::from_utf8_lossy(&pending));
        }
    }

    fn take_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.tail[start..].find('\n') {
            let end = start + offset;
            lines.push(self.tail[start..end].to_owned());
            start = end + 1;
        }
        self.tail.drain(..start);
        lines
    }
}
