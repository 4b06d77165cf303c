//! Newline-delimited text coming back from the bridge.
//!
//! The bridge forwards everything the display prints. Lines of the form
//! `CONTROL:<name>` are notifications for the host; anything else is
//! diagnostic output.

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::error::FrameError;

/// Prefix marking a control line.
pub const CONTROL_PREFIX: &str = "CONTROL:";

/// Control message sent by the display after each received packet.
pub const ACK: &str = "ACK";

/// Longest line buffered before it is flushed as a partial log line.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// One decoded line from the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceLine {
    /// `CONTROL:<name>`, carrying the trimmed name.
    Control(String),
    /// Anything else, with the line terminator removed.
    Log(String),
}

impl DeviceLine {
    /// Classify a single line (without its terminator).
    ///
    /// The control name runs up to the next `:` and is whitespace-trimmed,
    /// so `CONTROL: ACK :extra` names `ACK`.
    pub fn parse(line: &str) -> Self {
        match line.strip_prefix(CONTROL_PREFIX) {
            Some(rest) => {
                let name = rest.split(':').next().unwrap_or_default().trim();
                DeviceLine::Control(name.to_string())
            }
            None => DeviceLine::Log(line.to_string()),
        }
    }
}

/// Splits the bridge's byte stream into [`DeviceLine`]s.
///
/// Invalid UTF-8 is replaced rather than rejected: the radio link is noisy
/// and a garbled log line must not take the dispatcher down.
#[derive(Debug, Clone)]
pub struct ControlLineCodec {
    next_index: usize,
    max_length: usize,
    /// The bytes buffered so far continue an overlong line.
    continuation: bool,
}

impl ControlLineCodec {
    /// Codec with the default maximum line length.
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Codec that flushes lines longer than `max_length` bytes as partial
    /// log lines. A `max_length` of zero is treated as one.
    ///
    /// Every piece of an overlong line is a [`DeviceLine::Log`], even when
    /// a later piece happens to start with `CONTROL:`.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length: max_length.max(1),
            continuation: false,
        }
    }

    fn finish_line(&mut self, raw: &[u8]) -> DeviceLine {
        self.next_index = 0;
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let text = lossy(raw);
        if std::mem::take(&mut self.continuation) {
            DeviceLine::Log(text)
        } else {
            DeviceLine::parse(&text)
        }
    }
}

impl Default for ControlLineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ControlLineCodec {
    type Item = DeviceLine;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<DeviceLine>, FrameError> {
        let newline = src[self.next_index..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|offset| self.next_index + offset);

        match newline {
            Some(pos) if pos <= self.max_length => {
                let raw = src.split_to(pos + 1);
                Ok(Some(self.finish_line(&raw[..pos])))
            }
            _ if src.len() > self.max_length => {
                let raw = src.split_to(self.max_length);
                self.next_index = 0;
                self.continuation = true;
                debug!(max = self.max_length, "device line too long, flushing partial line");
                Ok(Some(DeviceLine::Log(lossy(&raw))))
            }
            _ => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<DeviceLine>, FrameError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let raw = src.split();
        Ok(Some(self.finish_line(&raw)))
    }
}

fn lossy(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}
