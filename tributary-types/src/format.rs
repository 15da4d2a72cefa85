//! Wire conventions and the result of extracting one line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The framing a backend uses for its streamed body.
///
/// Fixed for the whole of one run; formats are never mixed within a stream.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamFormat {
    /// Server-sent events: `data: <payload>` lines, `[DONE]` sentinel.
    Sse,
    /// One JSON object per line, no framing prefix.
    JsonLines,
    /// Every line is payload.
    #[default]
    Text,
}

impl StreamFormat {
    /// The canonical lower-case name (`sse`, `json-lines`, `text`).
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFormat::Sse => "sse",
            StreamFormat::JsonLines => "json-lines",
            StreamFormat::Text => "text",
        }
    }
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sse" => Ok(StreamFormat::Sse),
            // "json" is the name older adapters used for the same framing.
            "json-lines" | "json" | "ndjson" => Ok(StreamFormat::JsonLines),
            "text" => Ok(StreamFormat::Text),
            other => Err(format!("unknown stream format: {other}")),
        }
    }
}

/// What one line carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// A text fragment to append to the response.
    ///
    /// May be empty when the backend explicitly sent empty content
    /// (e.g. `{"response":""}`); the orchestrator drops empty deltas.
    Delta(String),
    /// The stream announced its own end (`data: [DONE]`). Not an error.
    Termination,
}

impl Extracted {
    /// The delta text, if this is a delta.
    pub fn as_delta(&self) -> Option<&str> {
        match self {
            Extracted::Delta(text) => Some(text),
            Extracted::Termination => None,
        }
    }

    /// Whether this is the termination sentinel.
    pub fn is_termination(&self) -> bool {
        matches!(self, Extracted::Termination)
    }
}
