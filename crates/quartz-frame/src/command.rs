//! Outbound commands and their wire encoding.
//!
//! Each [`Command`] renders to one ASCII line terminated by a carriage return.
//! [`Command::validate`] runs the per-command checks (name lengths, salvo id
//! range, restricted-mode capability) and must pass before anything is
//! written; [`Command::encode`] does both.

use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::level::{Level, LevelSet};

/// Longest destination, source or level name.
pub const MAX_NAME_LEN: usize = 8;

/// Longest destination, source or level button name.
pub const MAX_BUTTON_NAME_LEN: usize = 10;

/// Largest system salvo id (three digits).
pub const MAX_SYSTEM_SALVO_ID: u32 = 999;

/// Largest value of a timecode field (two digits).
pub const MAX_TIMECODE_FIELD: u8 = 99;

/// Device capability profile, fixed when the client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceMode {
    /// Every command is available.
    #[default]
    Standard,
    /// Level names, name writes and salvo management are unavailable.
    Restricted,
}

impl DeviceMode {
    pub fn from_restricted(restricted: bool) -> Self {
        if restricted {
            DeviceMode::Restricted
        } else {
            DeviceMode::Standard
        }
    }

    pub fn is_restricted(self) -> bool {
        self == DeviceMode::Restricted
    }
}

/// Firing time for a scheduled salvo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timecode {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl Timecode {
    pub fn new(hours: u8, minutes: u8, seconds: u8, frames: u8) -> Self {
        Self {
            hours,
            minutes,
            seconds,
            frames,
        }
    }

    fn validate(&self) -> Result<(), CommandError> {
        for (field, value) in [
            ("hours", self.hours),
            ("minutes", self.minutes),
            ("seconds", self.seconds),
            ("frames", self.frames),
        ] {
            if value > MAX_TIMECODE_FIELD {
                return Err(CommandError::TimecodeOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

/// One router control operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetCrosspoint {
        levels: LevelSet,
        destination: u32,
        source: u32,
    },
    LockDestination(u32),
    UnlockDestination(u32),
    QueryDestinationLock(u32),
    FireSystemSalvo(u32),
    GetRoute {
        level: Level,
        destination: u32,
    },
    ReadDestinationName(u32),
    ReadSourceName(u32),
    ReadLevelName(Level),
    ReadDestinationButtonName(u32),
    ReadSourceButtonName(u32),
    ReadLevelButtonName(Level),
    WriteDestinationName {
        destination: u32,
        name: String,
    },
    WriteSourceName {
        source: u32,
        name: String,
    },
    WriteLevelName {
        level: Level,
        name: String,
    },
    WriteDestinationButtonName {
        destination: u32,
        name: String,
    },
    WriteSourceButtonName {
        source: u32,
        name: String,
    },
    WriteLevelButtonName {
        level: Level,
        name: String,
    },
    SalvoSelect(u32),
    SalvoEmpty(u32),
    SalvoAddCrosspoint {
        levels: LevelSet,
        destination: u32,
        source: u32,
    },
    SalvoFireNow(u32),
    SalvoFireAt {
        salvo: u32,
        time: Timecode,
    },
    SalvoDelete(u32),
    SalvoListCount(u32),
    Ping,
}

impl Command {
    /// Short human-readable name, used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetCrosspoint { .. } => "set crosspoint",
            Command::LockDestination(_) => "lock destination",
            Command::UnlockDestination(_) => "unlock destination",
            Command::QueryDestinationLock(_) => "query destination lock",
            Command::FireSystemSalvo(_) => "fire system salvo",
            Command::GetRoute { .. } => "get route",
            Command::ReadDestinationName(_) => "read destination name",
            Command::ReadSourceName(_) => "read source name",
            Command::ReadLevelName(_) => "read level name",
            Command::ReadDestinationButtonName(_) => "read destination button name",
            Command::ReadSourceButtonName(_) => "read source button name",
            Command::ReadLevelButtonName(_) => "read level button name",
            Command::WriteDestinationName { .. } => "write destination name",
            Command::WriteSourceName { .. } => "write source name",
            Command::WriteLevelName { .. } => "write level name",
            Command::WriteDestinationButtonName { .. } => "write destination button name",
            Command::WriteSourceButtonName { .. } => "write source button name",
            Command::WriteLevelButtonName { .. } => "write level button name",
            Command::SalvoSelect(_) => "salvo select",
            Command::SalvoEmpty(_) => "salvo empty",
            Command::SalvoAddCrosspoint { .. } => "salvo add crosspoint",
            Command::SalvoFireNow(_) => "salvo fire",
            Command::SalvoFireAt { .. } => "salvo fire at time",
            Command::SalvoDelete(_) => "salvo delete",
            Command::SalvoListCount(_) => "salvo list count",
            Command::Ping => "ping",
        }
    }

    /// Whether a restricted device rejects this command.
    pub fn requires_standard_mode(&self) -> bool {
        !matches!(
            self,
            Command::SetCrosspoint { .. }
                | Command::LockDestination(_)
                | Command::UnlockDestination(_)
                | Command::QueryDestinationLock(_)
                | Command::FireSystemSalvo(_)
                | Command::GetRoute { .. }
                | Command::ReadDestinationName(_)
                | Command::ReadSourceName(_)
                | Command::ReadDestinationButtonName(_)
                | Command::ReadSourceButtonName(_)
                | Command::Ping
        )
    }

    /// Check the command against `mode` and its own argument limits.
    ///
    /// The capability check runs first.
    pub fn validate(&self, mode: DeviceMode) -> Result<(), CommandError> {
        if mode.is_restricted() && self.requires_standard_mode() {
            return Err(CommandError::Unsupported {
                command: self.name(),
            });
        }

        match self {
            Command::FireSystemSalvo(id) if *id > MAX_SYSTEM_SALVO_ID => {
                Err(CommandError::SalvoIdOutOfRange {
                    id: *id,
                    max: MAX_SYSTEM_SALVO_ID,
                })
            }
            Command::WriteDestinationName { name, .. }
            | Command::WriteSourceName { name, .. }
            | Command::WriteLevelName { name, .. } => validate_name(name, MAX_NAME_LEN),
            Command::WriteDestinationButtonName { name, .. }
            | Command::WriteSourceButtonName { name, .. }
            | Command::WriteLevelButtonName { name, .. } => {
                validate_name(name, MAX_BUTTON_NAME_LEN)
            }
            Command::SalvoFireAt { time, .. } => time.validate(),
            _ => Ok(()),
        }
    }

    /// Validate, then append the wire form to `dst`.
    ///
    /// Nothing is appended when validation fails.
    pub fn encode(&self, mode: DeviceMode, dst: &mut BytesMut) -> Result<(), CommandError> {
        self.validate(mode)?;
        dst.put_slice(self.to_wire().as_bytes());
        Ok(())
    }

    /// The wire form, including the trailing carriage return. Not validated.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

fn validate_name(name: &str, max: usize) -> Result<(), CommandError> {
    if name.len() > max {
        return Err(CommandError::NameTooLong {
            len: name.len(),
            max,
        });
    }
    if name.contains('\r') {
        return Err(CommandError::InvalidName);
    }
    Ok(())
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetCrosspoint {
                levels,
                destination,
                source,
            } => write!(f, ".S{levels}{destination},{source}\r"),
            Command::LockDestination(dest) => write!(f, ".BL{dest}\r"),
            Command::UnlockDestination(dest) => write!(f, ".BU{dest}\r"),
            Command::QueryDestinationLock(dest) => write!(f, ".BI{dest}\r"),
            Command::FireSystemSalvo(id) => write!(f, ".F{id}\r"),
            Command::GetRoute { level, destination } => write!(f, ".I{level}{destination}\r"),
            Command::ReadDestinationName(dest) => write!(f, ".RD{dest}\r"),
            Command::ReadSourceName(src) => write!(f, ".RS{src}\r"),
            Command::ReadLevelName(level) => write!(f, ".RL{level}\r"),
            Command::ReadDestinationButtonName(dest) => write!(f, ".RE{dest}\r"),
            Command::ReadSourceButtonName(src) => write!(f, ".RT{src}\r"),
            Command::ReadLevelButtonName(level) => write!(f, ".RM{level}\r"),
            Command::WriteDestinationName { destination, name } => {
                write!(f, ".WD{destination},{name}\r")
            }
            Command::WriteSourceName { source, name } => write!(f, ".WS{source},{name}\r"),
            // The router takes level names on the source-name prefix.
            Command::WriteLevelName { level, name } => write!(f, ".WS{level},{name}\r"),
            Command::WriteDestinationButtonName { destination, name } => {
                write!(f, ".WE{destination},{name}\r")
            }
            Command::WriteSourceButtonName { source, name } => write!(f, ".WT{source},{name}\r"),
            Command::WriteLevelButtonName { level, name } => write!(f, ".WM{level},{name}\r"),
            Command::SalvoSelect(id) => write!(f, ".QC{id}\r"),
            Command::SalvoEmpty(id) => write!(f, ".QR{id}\r"),
            Command::SalvoAddCrosspoint {
                levels,
                destination,
                source,
            } => write!(f, ".QS{levels}{destination},{source}\r"),
            Command::SalvoFireNow(id) => write!(f, ".QF{id}\r"),
            Command::SalvoFireAt { salvo, time } => write!(f, ".QF{salvo}T1:{time}\r"),
            Command::SalvoDelete(id) => write!(f, ".QD{id}\r"),
            Command::SalvoListCount(id) => write!(f, ".QL{id}\r"),
            Command::Ping => f.write_str(".#01\r"),
        }
    }
}
