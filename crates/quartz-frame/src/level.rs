//! Routing levels and their canonical ordering.
//!
//! A level is a single character naming an independently switchable layer
//! (`V` for video, letters for audio and data). The router expects level lists
//! with video first and everything else in character order; the same order is
//! applied to lists decoded from responses.

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

/// A single routing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Level(char);

impl Level {
    /// The video level. Always sorts first.
    pub const VIDEO: Level = Level('V');

    /// Create a level from its wire character.
    pub const fn new(code: char) -> Self {
        Self(code)
    }

    /// The wire character.
    pub const fn as_char(self) -> char {
        self.0
    }

    /// Whether this is the video level.
    pub fn is_video(self) -> bool {
        self == Self::VIDEO
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_video(), other.is_video()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<char> for Level {
    fn from(code: char) -> Self {
        Self(code)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.0)
    }
}

/// Sort levels into canonical order and drop duplicates.
pub fn canonicalize(levels: impl IntoIterator<Item = Level>) -> Vec<Level> {
    let mut out: Vec<Level> = levels.into_iter().collect();
    out.sort();
    out.dedup();
    out
}

/// Canonical wire form of a level list: the characters with no separator.
pub fn serialize(levels: impl IntoIterator<Item = Level>) -> String {
    canonicalize(levels).into_iter().map(Level::as_char).collect()
}

/// Treat every character of `text` as a level, then canonicalize.
pub fn parse(text: &str) -> LevelSet {
    text.chars().map(Level::new).collect()
}

/// An ordered set of levels, always held in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LevelSet(Vec<Level>);

impl LevelSet {
    /// Build a set from any collection of levels.
    pub fn new(levels: impl IntoIterator<Item = Level>) -> Self {
        Self(canonicalize(levels))
    }

    /// Just the video level.
    pub fn video() -> Self {
        Self(vec![Level::VIDEO])
    }

    pub fn as_slice(&self) -> &[Level] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = Level> + '_ {
        self.0.iter().copied()
    }

    pub fn first(&self) -> Option<Level> {
        self.0.first().copied()
    }

    pub fn contains(&self, level: Level) -> bool {
        self.0.contains(&level)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Level> {
        self.0
    }
}

impl FromIterator<Level> for LevelSet {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<&str> for LevelSet {
    fn from(text: &str) -> Self {
        parse(text)
    }
}

impl From<Level> for LevelSet {
    fn from(level: Level) -> Self {
        Self(vec![level])
    }
}

impl fmt::Display for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in &self.0 {
            write!(f, "{level}")?;
        }
        Ok(())
    }
}

impl Serialize for LevelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
