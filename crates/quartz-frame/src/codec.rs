use std::borrow::Cow;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// First byte of every frame.
pub const FRAME_START: u8 = b'.';

/// Last byte of every frame.
pub const FRAME_END: u8 = b'\r';

/// Default longest frame kept while waiting for its terminator.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024;

/// One complete protocol frame, `.` through `\r` inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    raw: Bytes,
}

impl Frame {
    /// Wrap raw frame bytes. No validation is done here.
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    /// The frame bytes including delimiters.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// The frame as text. The protocol is ASCII; anything else is replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        self.raw.len()
    }
}

/// Scan position carried between extraction passes over the same buffer.
///
/// Bytes before `pos` have already been inspected; `start` is the offset of
/// the `.` that opened the pending frame, if any. `discarding` is set while
/// the tail of an oversized frame is being skipped up to its `\r`.
#[derive(Debug, Clone, Default)]
pub struct ScanState {
    pos: usize,
    start: Option<usize>,
    discarding: bool,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a frame start has been seen without its terminator.
    pub fn in_frame(&self) -> bool {
        self.start.is_some()
    }

    /// Whether the rest of a dropped oversized frame is still being skipped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.start = None;
    }
}

/// Extract the next complete frame from `src`.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet; the
/// scan resumes from where it stopped on the next call. On success the frame
/// and every byte before it are split off the front of `src`.
///
/// A `.` seen while a frame is already pending is part of that frame, not a
/// new start. Bytes outside any frame are discarded. Once a pending frame
/// outgrows `max_frame_len`, everything through its `\r` is dropped with it.
pub fn extract_frame(
    src: &mut BytesMut,
    scan: &mut ScanState,
    max_frame_len: usize,
) -> Result<Option<Frame>> {
    let mut pos = scan.pos;
    while pos < src.len() {
        if scan.discarding {
            if src[pos] == FRAME_END {
                scan.discarding = false;
            }
            pos += 1;
            continue;
        }
        match (scan.start, src[pos]) {
            (None, FRAME_START) => scan.start = Some(pos),
            (Some(start), FRAME_END) => {
                let len = pos + 1 - start;
                let mut consumed = src.split_to(pos + 1);
                scan.reset();
                if len > max_frame_len {
                    return Err(FrameError::FrameTooLong {
                        len,
                        max: max_frame_len,
                    });
                }
                consumed.advance(start);
                return Ok(Some(Frame {
                    raw: consumed.freeze(),
                }));
            }
            _ => {}
        }
        pos += 1;
    }

    match scan.start {
        None => {
            // Nothing scanned so far can become part of a frame.
            src.clear();
            scan.reset();
        }
        Some(start) => {
            src.advance(start);
            scan.start = Some(0);
            scan.pos = src.len();

            if src.len() > max_frame_len {
                let len = src.len();
                src.clear();
                scan.reset();
                scan.discarding = true;
                return Err(FrameError::FrameTooLong {
                    len,
                    max: max_frame_len,
                });
            }
        }
    }

    Ok(None)
}

/// Accumulates stream bytes and hands out complete frames in arrival order.
#[derive(Debug)]
pub struct FrameExtractor {
    buf: BytesMut,
    scan: ScanState,
    max_frame_len: usize,
}

impl FrameExtractor {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(max_frame_len.min(64 * 1024)),
            scan: ScanState::new(),
            max_frame_len,
        }
    }

    /// Append freshly read bytes.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Next complete frame, if one is buffered.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        extract_frame(&mut self.buf, &mut self.scan, self.max_frame_len)
    }

    /// Append `data` and return every frame it completes.
    ///
    /// Oversized frames are skipped; use [`next_frame`](Self::next_frame) to
    /// observe them as errors.
    pub fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        self.extend(data);
        let mut frames = Vec::new();
        loop {
            match self.next_frame() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => return frames,
                Err(err) => tracing::warn!(error = %err, "discarding oversized frame"),
            }
        }
    }

    /// Bytes held back waiting for a terminator.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    pub fn in_frame(&self) -> bool {
        self.scan.in_frame()
    }

    pub fn is_discarding(&self) -> bool {
        self.scan.is_discarding()
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    pub fn set_max_frame_len(&mut self, max_frame_len: usize) {
        self.max_frame_len = max_frame_len;
    }
}

impl Default for FrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for frame reading and command writing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Longest frame kept while waiting for its terminator. Default: 1024 bytes.
    pub max_frame_len: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
