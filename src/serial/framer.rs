//! # Line Framer
//!
//! Reassembles newline-terminated lines from arbitrary serial read chunks.
//! A line split across two reads comes out whole; a runaway line with no
//! newline is discarded once it passes the length limit.

use bytes::{Buf, Bytes, BytesMut};
use tracing::warn;

/// Longest line accepted before the accumulator is discarded
pub const MAX_LINE_LEN: usize = 1024;

/// Splits a byte stream into lines
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    max_line_len: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_line_len),
            max_line_len,
        }
    }

    /// Append freshly read bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Accumulator for reading directly into
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        self.buf.reserve(64);
        &mut self.buf
    }

    /// Next complete line, without its `\n`
    pub fn next_line(&mut self) -> Option<Bytes> {
        match self.buf.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let line = self.buf.split_to(pos).freeze();
                self.buf.advance(1);
                Some(line)
            }
            None => {
                if self.buf.len() > self.max_line_len {
                    warn!("Discarding {} bytes without a line terminator", self.buf.len());
                    self.buf.clear();
                }
                None
            }
        }
    }

    /// Unterminated trailing bytes, taken at end of stream
    pub fn take_remainder(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }

    /// Bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
