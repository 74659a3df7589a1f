//! Decoding of router responses and broadcasts.
//!
//! Every frame the router sends is classified by its second character:
//!
//! ```text
//! .A\r                     acknowledge
//! .A{levels}{dest},{src}\r route echo (decoded as an update)
//! .E\r                     error
//! .P\r                     power on
//! .U{levels}{dest},{src}\r crosspoint update
//! .RA{D|S|L}{id},{name}\r  name answer (the short form .R{D|S|L} is accepted too)
//! .BA{dest},{status}\r     lock status, 0 = locked
//! ```

use std::fmt;

use serde::Serialize;

use crate::codec::Frame;
use crate::error::DecodeError;
use crate::level::{self, Level, LevelSet};

/// Fieldless tag for each response variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Acknowledge,
    Error,
    PowerOn,
    Update,
    ReadDestination,
    ReadSource,
    ReadLevel,
    LockStatus,
}

impl ResponseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseKind::Acknowledge => "acknowledge",
            ResponseKind::Error => "error",
            ResponseKind::PowerOn => "power_on",
            ResponseKind::Update => "update",
            ResponseKind::ReadDestination => "read_destination",
            ResponseKind::ReadSource => "read_source",
            ResponseKind::ReadLevel => "read_level",
            ResponseKind::LockStatus => "lock_status",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded router message. Every variant keeps the frame text verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// A simple command was accepted.
    Acknowledge { raw: String },
    /// The router rejected a command.
    Error { raw: String },
    /// The router announced power-up.
    PowerOn { raw: String },
    /// A crosspoint changed, or a route query was answered.
    Update {
        raw: String,
        levels: LevelSet,
        destination: u32,
        source: u32,
    },
    ReadDestination {
        raw: String,
        destination: u32,
        name: String,
    },
    ReadSource {
        raw: String,
        source: u32,
        name: String,
    },
    ReadLevel {
        raw: String,
        level: Level,
        name: String,
    },
    LockStatus {
        raw: String,
        destination: u32,
        locked: bool,
    },
}

impl Response {
    /// Decode one complete frame.
    pub fn decode_frame(frame: &Frame) -> Result<Self, DecodeError> {
        Self::decode(&frame.text())
    }

    /// Decode the text of one frame, delimiters included.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        if !text.starts_with('.') || !text.ends_with('\r') {
            return Err(DecodeError::NotAFrame);
        }
        let raw = text.to_string();

        match text.as_bytes()[1] {
            b'A' if text.len() == 3 => Ok(Response::Acknowledge { raw }),
            b'A' | b'U' => {
                let (levels, destination, source) = parse_route(text)?;
                Ok(Response::Update {
                    raw,
                    levels,
                    destination,
                    source,
                })
            }
            b'E' => Ok(Response::Error { raw }),
            b'P' => Ok(Response::PowerOn { raw }),
            b'R' => parse_name_answer(text, raw),
            b'B' => {
                let (destination, locked) = parse_lock_status(text)?;
                Ok(Response::LockStatus {
                    raw,
                    destination,
                    locked,
                })
            }
            other => Err(DecodeError::Unrecognized(char::from(other))),
        }
    }

    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::Acknowledge { .. } => ResponseKind::Acknowledge,
            Response::Error { .. } => ResponseKind::Error,
            Response::PowerOn { .. } => ResponseKind::PowerOn,
            Response::Update { .. } => ResponseKind::Update,
            Response::ReadDestination { .. } => ResponseKind::ReadDestination,
            Response::ReadSource { .. } => ResponseKind::ReadSource,
            Response::ReadLevel { .. } => ResponseKind::ReadLevel,
            Response::LockStatus { .. } => ResponseKind::LockStatus,
        }
    }

    /// The frame text exactly as received.
    pub fn raw(&self) -> &str {
        match self {
            Response::Acknowledge { raw }
            | Response::Error { raw }
            | Response::PowerOn { raw }
            | Response::Update { raw, .. }
            | Response::ReadDestination { raw, .. }
            | Response::ReadSource { raw, .. }
            | Response::ReadLevel { raw, .. }
            | Response::LockStatus { raw, .. } => raw,
        }
    }
}

// `{levels}{dest},{src}` starting at index 2.
fn parse_route(text: &str) -> Result<(LevelSet, u32, u32), DecodeError> {
    let digit = text[2..]
        .find(|c: char| c.is_ascii_digit())
        .map(|idx| idx + 2);
    let comma = text.find(',');
    let (digit, comma) = match (digit, comma) {
        (Some(digit), Some(comma)) => (digit, comma),
        (_, None) => return Err(DecodeError::MissingComma),
        (None, _) => return Err(DecodeError::MissingDigit),
    };

    let levels = level::parse(&text[2..digit]);
    let destination = parse_number("destination", text.get(digit..comma))?;
    let source = parse_number("source", text.get(comma + 1..text.len() - 1))?;
    Ok((levels, destination, source))
}

fn parse_name_answer(text: &str, raw: String) -> Result<Response, DecodeError> {
    let bytes = text.as_bytes();
    let (sub_kind, id_start) = match bytes.get(2) {
        Some(&b'A') => (bytes.get(3), 4),
        other => (other, 3),
    };
    let sub_kind = match sub_kind {
        Some(&b'\r') | None => return Err(DecodeError::Truncated),
        Some(&byte) => byte,
    };

    let comma = text.find(',').ok_or(DecodeError::MissingComma)?;
    let id = text.get(id_start..comma);
    let name = text[comma + 1..text.len() - 1].to_string();

    match sub_kind {
        b'D' => Ok(Response::ReadDestination {
            raw,
            destination: parse_number("destination", id)?,
            name,
        }),
        b'S' => Ok(Response::ReadSource {
            raw,
            source: parse_number("source", id)?,
            name,
        }),
        b'L' => {
            let level = id
                .map(level::parse)
                .and_then(|levels| levels.first())
                .ok_or(DecodeError::EmptyLevel)?;
            Ok(Response::ReadLevel { raw, level, name })
        }
        other => Err(DecodeError::UnrecognizedName(char::from(other))),
    }
}

// `.BA{dest},{status}`: destination from index 3.
fn parse_lock_status(text: &str) -> Result<(u32, bool), DecodeError> {
    let comma = text.find(',').ok_or(DecodeError::MissingComma)?;
    let destination = parse_number("destination", text.get(3..comma))?;
    let status_text = text.get(comma + 1..text.len() - 1).unwrap_or_default();
    let status: i64 = status_text
        .parse()
        .map_err(|_| DecodeError::InvalidNumber {
            field: "lock status",
            value: status_text.to_string(),
        })?;
    Ok((destination, status == 0))
}

fn parse_number(field: &'static str, value: Option<&str>) -> Result<u32, DecodeError> {
    let value = value.unwrap_or_default();
    value.parse().map_err(|_| DecodeError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
