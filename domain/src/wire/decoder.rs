//! Incremental decoders for relay response bodies.
//!
//! Bytes arrive in arbitrary chunks: a UTF-8 sequence or a reserved marker may
//! be split across two reads. Decoders keep the minimum necessary state to
//! emit every complete frame as soon as it is available.

use super::frame::{ERROR_MARKER, Framing, RelayFrame, TRUNCATION_MARKER};

const UNKNOWN_GENERATION_ERROR: &str = "An unknown error occurred during generation.";

/// Decoder for either framing.
#[derive(Debug)]
pub enum StreamDecoder {
    Inline(InlineDecoder),
    Ndjson(NdjsonDecoder),
}

impl StreamDecoder {
    pub fn new(framing: Framing) -> Self {
        match framing {
            Framing::Inline => StreamDecoder::Inline(InlineDecoder::default()),
            Framing::Ndjson => StreamDecoder::Ndjson(NdjsonDecoder::default()),
        }
    }

    /// Feed one chunk of the body and return the frames it completes.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<RelayFrame> {
        match self {
            StreamDecoder::Inline(d) => d.push(bytes),
            StreamDecoder::Ndjson(d) => d.push(bytes),
        }
    }

    /// Flush whatever is still buffered at end of body.
    pub fn finish(&mut self) -> Vec<RelayFrame> {
        match self {
            StreamDecoder::Inline(d) => d.finish(),
            StreamDecoder::Ndjson(d) => d.finish(),
        }
    }
}

/// Streaming UTF-8 decoder holding back incomplete trailing sequences.
#[derive(Debug, Default)]
struct Utf8Buffer {
    pending: Vec<u8>,
}

impl Utf8Buffer {
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.push_str(s);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    fn finish(&mut self) -> String {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        rest
    }
}

/// Decoder for the inline-marker text framing.
///
/// Content is forwarded as it arrives except for a trailing fragment that
/// could be the start of a marker; that fragment waits for the next chunk.
/// Everything after the error marker is the error message, so the error frame
/// is only emitted at end of body.
#[derive(Debug, Default)]
pub struct InlineDecoder {
    utf8: Utf8Buffer,
    buffer: String,
    error: Option<String>,
}

impl InlineDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<RelayFrame> {
        let text = self.utf8.decode(bytes);
        if let Some(message) = self.error.as_mut() {
            message.push_str(&text);
            return Vec::new();
        }
        self.buffer.push_str(&text);
        self.drain(false)
    }

    pub fn finish(&mut self) -> Vec<RelayFrame> {
        let rest = self.utf8.finish();
        match self.error.as_mut() {
            Some(message) => message.push_str(&rest),
            None => self.buffer.push_str(&rest),
        }
        self.drain(true)
    }

    fn drain(&mut self, at_end: bool) -> Vec<RelayFrame> {
        if self.error.is_none() {
            if let Some(pos) = self.buffer.find(ERROR_MARKER) {
                let message = self.buffer.split_off(pos + ERROR_MARKER.len());
                self.buffer.truncate(pos);
                self.error = Some(message);
            }
        }

        let mut truncated = false;
        while let Some(pos) = self.buffer.find(TRUNCATION_MARKER) {
            self.buffer
                .replace_range(pos..pos + TRUNCATION_MARKER.len(), "");
            truncated = true;
        }

        let keep = if at_end || self.error.is_some() {
            0
        } else {
            marker_prefix_suffix_len(&self.buffer)
        };
        let emit_len = self.buffer.len() - keep;
        let mut frames = Vec::new();
        if emit_len > 0 {
            let rest = self.buffer.split_off(emit_len);
            let content = std::mem::replace(&mut self.buffer, rest);
            frames.push(RelayFrame::Content(content));
        }
        if truncated {
            frames.push(RelayFrame::Truncated);
        }
        if at_end {
            if let Some(message) = self.error.take() {
                let message = if message.trim().is_empty() {
                    UNKNOWN_GENERATION_ERROR.to_string()
                } else {
                    message
                };
                frames.push(RelayFrame::Error(message));
            }
        }
        frames
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of a marker.
fn marker_prefix_suffix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    [ERROR_MARKER, TRUNCATION_MARKER]
        .iter()
        .flat_map(|marker| {
            let marker = marker.as_bytes();
            (1..marker.len().min(bytes.len() + 1))
                .rev()
                .find(|&n| bytes.ends_with(&marker[..n]))
        })
        .max()
        .unwrap_or(0)
}

/// Decoder for line-delimited JSON envelopes.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    utf8: Utf8Buffer,
    line: String,
}

impl NdjsonDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<RelayFrame> {
        let text = self.utf8.decode(bytes);
        self.line.push_str(&text);

        let mut frames = Vec::new();
        while let Some(newline) = self.line.find('\n') {
            let rest = self.line.split_off(newline + 1);
            let line = std::mem::replace(&mut self.line, rest);
            if let Some(frame) = parse_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    pub fn finish(&mut self) -> Vec<RelayFrame> {
        let rest = self.utf8.finish();
        self.line.push_str(&rest);
        let line = std::mem::take(&mut self.line);
        parse_line(&line).into_iter().collect()
    }
}

fn parse_line(line: &str) -> Option<RelayFrame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(
        serde_json::from_str::<RelayFrame>(line)
            .unwrap_or_else(|e| RelayFrame::Error(format!("Malformed stream frame: {}", e))),
    )
}
