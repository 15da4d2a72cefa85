//! Known completion backends and the framing each one streams.
//!
//! Adapters do not parse their own streams. They declare which backend they
//! talk to and hand the response body to the shared orchestrator, which
//! picks the format from here.

use crate::format::StreamFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A streaming completion backend.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI chat completions (`choices[0].delta.content` over SSE).
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic messages (`content_block_delta` events over SSE).
    Anthropic,
    /// Gemini `streamGenerateContent` (candidate parts, one object per line).
    Gemini,
    /// Ollama `/api/generate` (`response` field, NDJSON).
    Ollama,
}

impl Backend {
    /// Every known backend.
    pub const ALL: [Backend; 4] = [
        Backend::OpenAi,
        Backend::Anthropic,
        Backend::Gemini,
        Backend::Ollama,
    ];

    /// The framing this backend uses for streamed bodies.
    pub fn stream_format(&self) -> StreamFormat {
        match self {
            Backend::OpenAi | Backend::Anthropic => StreamFormat::Sse,
            Backend::Gemini | Backend::Ollama => StreamFormat::JsonLines,
        }
    }

    /// Whether the backend runs on the local machine.
    pub fn is_local(&self) -> bool {
        matches!(self, Backend::Ollama)
    }

    /// The lower-case backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenAi => "openai",
            Backend::Anthropic => "anthropic",
            Backend::Gemini => "gemini",
            Backend::Ollama => "ollama",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| format!("unknown backend: {s}"))
    }
}
