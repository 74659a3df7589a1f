/// Errors that can occur while reading frames or writing commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A pending frame grew past the configured maximum and was discarded.
    #[error("frame too long ({len} bytes, max {max})")]
    FrameTooLong { len: usize, max: usize },

    /// The command was rejected before anything was written.
    #[error("invalid command: {0}")]
    Command(#[from] CommandError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection reached end-of-stream.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Reasons a complete frame could not be turned into a [`Response`](crate::Response).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The text does not start with `.` and end with a carriage return.
    #[error("not a frame")]
    NotAFrame,

    /// The frame is too short for its kind.
    #[error("truncated frame")]
    Truncated,

    /// The kind character is not one the decoder knows.
    #[error("unrecognized response kind {0:?}")]
    Unrecognized(char),

    /// A name answer carried an unknown sub-kind.
    #[error("unrecognized name answer {0:?}")]
    UnrecognizedName(char),

    /// No comma separating the fields.
    #[error("missing comma")]
    MissingComma,

    /// No digit where a destination number should start.
    #[error("missing destination digits")]
    MissingDigit,

    /// A numeric field did not parse.
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// A level name answer carried no level character.
    #[error("empty level identifier")]
    EmptyLevel,
}

/// Pre-send validation failures. Nothing is written when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The command is not available on a restricted device.
    #[error("{command} is not supported in restricted mode")]
    Unsupported { command: &'static str },

    /// The name is longer than the device accepts.
    #[error("name too long ({len} bytes, max {max})")]
    NameTooLong { len: usize, max: usize },

    /// The name contains a carriage return, which would end the frame early.
    #[error("name must not contain a carriage return")]
    InvalidName,

    /// System salvo ids are at most three digits.
    #[error("salvo id {id} out of range (max {max})")]
    SalvoIdOutOfRange { id: u32, max: u32 },

    /// A timecode field does not fit in two digits.
    #[error("timecode {field} {value} out of range")]
    TimecodeOutOfRange { field: &'static str, value: u8 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
