//! Newline-delimited request framing.
//!
//! # Design Principles
//!
//! 1. **State Machine Pattern**: The framer is either scanning for a request
//!    terminator or discarding the remainder of an oversized line.
//! 2. **Streaming Friendly**: Frames are cut out of a growing `BytesMut`;
//!    `None` means more bytes are needed.
//! 3. **Bounded**: A line longer than the ceiling yields a single
//!    [`Frame::Oversized`] instead of being truncated.

use bytes::{Buf, Bytes, BytesMut};

/// One unit cut from the input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete request line, terminator stripped.
    Request(Bytes),
    /// A line exceeded the ceiling; its bytes were dropped.
    Oversized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Scanning,
    Discarding,
}

/// Splits a byte stream into request lines.
#[derive(Debug)]
pub struct LineFramer {
    state: FrameState,
    max_len: usize,
}

impl LineFramer {
    /// Creates a framer accepting lines of at most `max_len` bytes.
    pub fn new(max_len: usize) -> Self {
        LineFramer {
            state: FrameState::Scanning,
            max_len,
        }
    }

    /// Attempts to cut the next frame out of `buf`.
    pub fn next_frame(&mut self, buf: &mut BytesMut) -> Option<Frame> {
        loop {
            match self.state {
                FrameState::Scanning => {
                    let Some(idx) = find_newline(buf) else {
                        // One extra byte of slack for a pending '\r'.
                        if buf.len() > self.max_len + 1 {
                            buf.clear();
                            self.state = FrameState::Discarding;
                            return Some(Frame::Oversized);
                        }
                        return None;
                    };

                    let line = buf.split_to(idx + 1);
                    let line = trim_line(&line);
                    if line.len() > self.max_len {
                        return Some(Frame::Oversized);
                    }
                    return Some(Frame::Request(Bytes::copy_from_slice(line)));
                }
                FrameState::Discarding => {
                    let Some(idx) = find_newline(buf) else {
                        buf.clear();
                        return None;
                    };
                    buf.advance(idx + 1);
                    self.state = FrameState::Scanning;
                }
            }
        }
    }

    /// Flushes an unterminated final request once the peer stopped sending.
    pub fn finish(&mut self, buf: &mut BytesMut) -> Option<Frame> {
        if let Some(frame) = self.next_frame(buf) {
            return Some(frame);
        }
        if self.state == FrameState::Discarding {
            buf.clear();
            return None;
        }

        let rest = buf.split();
        let line = trim_line(&rest);
        if line.is_empty() {
            return None;
        }
        if line.len() > self.max_len {
            return Some(Frame::Oversized);
        }
        Some(Frame::Request(Bytes::copy_from_slice(line)))
    }
}

fn find_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &line[..end]
}
