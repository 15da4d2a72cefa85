//! Configuration for a stream run.

use crate::format::StreamFormat;
use serde::{Deserialize, Serialize};

/// Default accumulator bound: one mebibyte of response text.
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Static configuration for an orchestrator.
///
/// Per-run input (the producer, and the format when given) comes with the
/// call. This struct holds the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Maximum accumulated response size in bytes. Appending past it fails
    /// the run with an overflow.
    pub max_buffer_bytes: usize,

    /// Format used for pull-mode input that does not declare one.
    pub format: StreamFormat,
}

impl StreamConfig {
    /// Override the accumulator bound.
    pub fn with_max_buffer_bytes(mut self, max_buffer_bytes: usize) -> Self {
        self.max_buffer_bytes = max_buffer_bytes;
        self
    }

    /// Override the default format.
    pub fn with_format(mut self, format: StreamFormat) -> Self {
        self.format = format;
        self
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            format: StreamFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.max_buffer_bytes, 1024 * 1024);
        assert_eq!(config.format, StreamFormat::Text);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StreamConfig = serde_json::from_str(r#"{"format":"sse"}"#).unwrap();
        assert_eq!(config.format, StreamFormat::Sse);
        assert_eq!(config.max_buffer_bytes, DEFAULT_MAX_BUFFER_BYTES);
    }

    #[test]
    fn builder_overrides() {
        let config = StreamConfig::default()
            .with_max_buffer_bytes(64)
            .with_format(StreamFormat::JsonLines);
        assert_eq!(config.max_buffer_bytes, 64);
        assert_eq!(config.format, StreamFormat::JsonLines);
    }
}
