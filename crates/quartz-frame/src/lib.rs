//! Framing and codec layer for the Quartz router control protocol.
//!
//! The protocol is line oriented ASCII. Every message in either direction is
//! one frame:
//! - a `.` start byte
//! - a command or response body
//! - a carriage return terminator
//!
//! Bytes between frames are noise and are discarded. This crate extracts
//! frames from a byte stream, decodes them into [`Response`] values and
//! validates and encodes outbound [`Command`]s.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod command;
pub mod error;
pub mod level;
pub mod reader;
pub mod response;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::QuartzCodec;
pub use codec::{
    extract_frame, Frame, FrameConfig, FrameExtractor, ScanState, DEFAULT_MAX_FRAME_LEN,
    FRAME_END, FRAME_START,
};
pub use command::{
    Command, DeviceMode, Timecode, MAX_BUTTON_NAME_LEN, MAX_NAME_LEN, MAX_SYSTEM_SALVO_ID,
    MAX_TIMECODE_FIELD,
};
pub use error::{CommandError, DecodeError, FrameError, Result};
pub use level::{Level, LevelSet};
pub use reader::{is_timeout, FrameReader};
pub use response::{Response, ResponseKind};
pub use writer::{is_end_of_stream, CommandWriter};
