//! Stream parser for printer responses.
//!
//! TCP has no message boundaries: one read may carry half a frame, a frame
//! and a half, or noise the printer emitted between frames. [`StreamParser`]
//! buffers whatever arrives and cuts out complete `STX ... ETX` spans.
//!
//! The parser only delimits frames. It does not check the checksum and it
//! keeps every byte between the markers untouched, including code page bytes
//! above 0x7F; [`decode_frame`](crate::frame::decode_frame) validates each
//! extracted span.
//!
//! # Usage
//!
//! ```
//! use paragon_protocol::StreamParser;
//!
//! let mut parser = StreamParser::new();
//!
//! parser.feed(b"\x02trinit\t#");
//! assert!(parser.next_frame().is_none());
//!
//! parser.feed(b"1A2B\x03");
//! let raw = parser.next_frame().unwrap();
//! assert_eq!(&raw[..], b"\x02trinit\t#1A2B\x03");
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use paragon_core::constants::{END_BYTE, MAX_FRAME_BUFFER, START_BYTE};
use std::collections::VecDeque;
use tracing::warn;

/// Initial capacity for incoming TCP data.
const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Initial capacity for frame assembly.
const INITIAL_FRAME_CAPACITY: usize = 256;

/// Parser state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Scanning for STX; bytes before it are discarded.
    WaitingStart,

    /// STX seen, accumulating bytes until ETX.
    ReadingFrame,
}

/// Stateful parser extracting raw frames from a byte stream.
///
/// ```text
/// ┌─────────────┐  STX   ┌──────────────┐  ETX   ┌─────────────┐
/// │WaitingStart │───────>│ ReadingFrame │───────>│ frame queued│
/// └─────────────┘        └──────────────┘        └─────────────┘
///    ^   │ other bytes          │ > MAX_FRAME_BUFFER     │
///    │   │ (discarded)          │ (reset)                │
///    └───┴──────────────────────┴────────────────────────┘
/// ```
///
/// Extracted frames include both markers, so they can be handed straight to
/// [`decode_frame`](crate::frame::decode_frame). Bytes following an ETX stay
/// buffered for the next frame.
#[derive(Debug)]
pub struct StreamParser {
    buffer: BytesMut,
    state: ParserState,
    frame: BytesMut,
    frames: VecDeque<Bytes>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: ParserState::WaitingStart,
            frame: BytesMut::with_capacity(INITIAL_FRAME_CAPACITY),
            frames: VecDeque::new(),
        }
    }

    /// Append bytes read from the stream and extract every completed frame.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);

        while self.try_extract_frame() {}
    }

    /// Pop the oldest complete frame, `STX` and `ETX` included.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        self.frames.pop_front()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn frames_available(&self) -> usize {
        self.frames.len()
    }

    /// Bytes held back: unframed input plus the partial frame being assembled.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.frame.len()
    }

    /// Drop all buffered input, the partial frame and queued frames.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.frame.clear();
        self.frames.clear();
        self.state = ParserState::WaitingStart;
    }

    /// Iterate over the frames queued so far.
    ///
    /// ```
    /// use paragon_protocol::StreamParser;
    ///
    /// let mut parser = StreamParser::new();
    /// parser.feed(b"\x02a#0000\x03\x02b#0000\x03");
    /// assert_eq!(parser.drain_frames().count(), 2);
    /// assert_eq!(parser.frames_available(), 0);
    /// ```
    pub fn drain_frames(&mut self) -> DrainFrames<'_> {
        DrainFrames { parser: self }
    }

    fn try_extract_frame(&mut self) -> bool {
        if self.buffered_len() > MAX_FRAME_BUFFER {
            warn!(
                buffered = self.buffered_len(),
                "Response stream exceeded {} bytes without a frame end, discarding", MAX_FRAME_BUFFER
            );
            self.buffer.clear();
            self.frame.clear();
            self.state = ParserState::WaitingStart;
            return false;
        }

        match self.state {
            ParserState::WaitingStart => {
                let Some(stx_pos) = self.buffer.iter().position(|&b| b == START_BYTE) else {
                    self.buffer.clear();
                    return false;
                };
                let _ = self.buffer.split_to(stx_pos + 1);
                self.frame.clear();
                self.frame.put_u8(START_BYTE);
                self.state = ParserState::ReadingFrame;
                true
            }
            ParserState::ReadingFrame => {
                if let Some(etx_pos) = self.buffer.iter().position(|&b| b == END_BYTE) {
                    let rest = self.buffer.split_to(etx_pos + 1);
                    self.frame.extend_from_slice(&rest);
                    self.frames.push_back(self.frame.split().freeze());
                    self.state = ParserState::WaitingStart;
                    true
                } else {
                    let pending = self.buffer.split();
                    self.frame.extend_from_slice(&pending);
                    false
                }
            }
        }
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`StreamParser::drain_frames`].
pub struct DrainFrames<'a> {
    parser: &'a mut StreamParser,
}

impl Iterator for DrainFrames<'_> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.parser.frames_available();
        (len, Some(len))
    }
}

impl ExactSizeIterator for DrainFrames<'_> {}
