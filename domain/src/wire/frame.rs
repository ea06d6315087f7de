//! Relay frames and their on-the-wire encodings

use serde::Deserialize;

/// Prefix of an in-band generation error. The rest of the stream is the message.
pub const ERROR_MARKER: &str = "STREAM_ERROR: ";

/// Written as the final write when the model hit its output length limit.
pub const TRUNCATION_MARKER: &str = "__STREAM_TRUNCATED__";

/// One unit written by the relay onto the response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RelayFrame {
    /// Model output, forwarded verbatim.
    Content(String),
    /// The answer was cut off by the output length limit.
    Truncated,
    /// Generation failed mid-stream; terminal.
    Error(String),
    /// Explicit end of stream (line-delimited framing only).
    Done,
}

impl RelayFrame {
    /// Encode this frame for the given framing.
    pub fn encode(&self, framing: Framing) -> String {
        match framing {
            Framing::Inline => match self {
                RelayFrame::Content(text) => text.clone(),
                RelayFrame::Truncated => TRUNCATION_MARKER.to_string(),
                RelayFrame::Error(message) => format!("{}{}", ERROR_MARKER, message),
                RelayFrame::Done => String::new(),
            },
            Framing::Ndjson => {
                let value = match self {
                    RelayFrame::Content(text) => {
                        serde_json::json!({"type": "content", "data": text})
                    }
                    RelayFrame::Truncated => serde_json::json!({"type": "truncated"}),
                    RelayFrame::Error(message) => {
                        serde_json::json!({"type": "error", "data": message})
                    }
                    RelayFrame::Done => serde_json::json!({"type": "done"}),
                };
                format!("{}\n", value)
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RelayFrame::Error(_) | RelayFrame::Done)
    }
}

/// How relay frames are laid out on the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Raw text with reserved in-band markers.
    #[default]
    Inline,
    /// One JSON envelope per line: `{"type": "content" | "truncated" | "error" | "done", "data": ...}`.
    Ndjson,
}

impl Framing {
    pub const INLINE_CONTENT_TYPE: &'static str = "text/plain; charset=utf-8";
    pub const NDJSON_CONTENT_TYPE: &'static str = "application/x-ndjson";

    pub fn content_type(&self) -> &'static str {
        match self {
            Framing::Inline => Self::INLINE_CONTENT_TYPE,
            Framing::Ndjson => Self::NDJSON_CONTENT_TYPE,
        }
    }

    /// Framing requested by a client's `Accept` header.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(value) if value.contains(Self::NDJSON_CONTENT_TYPE) => Framing::Ndjson,
            _ => Framing::Inline,
        }
    }

    /// Framing of a response, judged by its `Content-Type` header.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(value) if value.starts_with(Self::NDJSON_CONTENT_TYPE) => Framing::Ndjson,
            _ => Framing::Inline,
        }
    }
}

impl std::fmt::Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framing::Inline => write!(f, "inline"),
            Framing::Ndjson => write!(f, "ndjson"),
        }
    }
}

impl std::str::FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(Framing::Inline),
            "ndjson" => Ok(Framing::Ndjson),
            other => Err(format!("unknown framing: {}", other)),
        }
    }
}
