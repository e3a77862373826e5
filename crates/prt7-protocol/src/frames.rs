//! Frames exchanged over the PRT-7 link.
//!
//! A frame line is `<CMD>,<DATA>`:
//! - `L,<char>` / `L,Space` - load one cipher-shifted character
//! - `M,<offset>` - rotate the decoder's rotor by a signed offset
//!
//! The split point is the **last** comma in the line and the command is the
//! first character of the line. Anything in between is ignored.

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult, MalformedReason};

/// Field delimiter between command and data.
pub const DELIMITER: char = ',';

/// Data token standing for a blank in LOAD frames (matched case-insensitively).
pub const SPACE_TOKEN: &str = "Space";

/// Frame command characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Load one character (`L`).
    Load,
    /// Rotate the rotor (`M`).
    Map,
}

impl Command {
    /// Get the command character used on the wire.
    pub fn as_char(&self) -> char {
        match self {
            Command::Load => 'L',
            Command::Map => 'M',
        }
    }

    /// Parse a command from its wire character, ignoring case.
    pub fn from_char(c: char) -> Option<Command> {
        match c.to_ascii_uppercase() {
            'L' => Some(Command::Load),
            'M' => Some(Command::Map),
            _ => None,
        }
    }
}

/// How MAP data that is not a clean integer is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// C `atoi` semantics: parse the leading integer, `0` if there is none.
    #[default]
    Permissive,
    /// Reject the frame with [`FrameError::InvalidRotation`].
    Strict,
}

/// A single decoded protocol frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// A character to run through the rotor and append to the message.
    Load(char),
    /// A signed rotor rotation (positive = forward).
    Map(i32),
}

impl Frame {
    /// The command this frame was sent with.
    pub fn command(&self) -> Command {
        match self {
            Frame::Load(_) => Command::Load,
            Frame::Map(_) => Command::Map,
        }
    }

    /// Encode the frame as a wire line (without terminator).
    pub fn to_line(&self) -> String {
        match self {
            Frame::Load(' ') => format!("{}{}{}", Command::Load.as_char(), DELIMITER, SPACE_TOKEN),
            Frame::Load(c) => format!("{}{}{}", Command::Load.as_char(), DELIMITER, c),
            Frame::Map(n) => format!("{}{}{}", Command::Map.as_char(), DELIMITER, n),
        }
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// Parse one raw line into a [`Frame`].
///
/// Trailing `\r` / `\n` are stripped first. Never panics; every failure is
/// classified as a [`FrameError`].
pub fn parse_frame(line: &str, policy: RotationPolicy) -> FrameResult<Frame> {
    let line = line.trim_end_matches(['\r', '\n']);

    let malformed = |reason| FrameError::MalformedFrame {
        line: line.to_string(),
        reason,
    };

    if line.is_empty() {
        return Err(malformed(MalformedReason::Empty));
    }

    let comma = line
        .rfind(DELIMITER)
        .ok_or_else(|| malformed(MalformedReason::MissingDelimiter))?;
    if comma == 0 {
        return Err(malformed(MalformedReason::EmptyCommand));
    }
    if comma + DELIMITER.len_utf8() == line.len() {
        return Err(malformed(MalformedReason::EmptyData));
    }

    // Non-empty: the comma is not at index 0.
    let command_char = match line.chars().next() {
        Some(c) => c,
        None => return Err(malformed(MalformedReason::Empty)),
    };
    let data = &line[comma + DELIMITER.len_utf8()..];

    match Command::from_char(command_char) {
        Some(Command::Load) => Ok(Frame::Load(parse_load_data(data))),
        Some(Command::Map) => Ok(Frame::Map(parse_rotation(data, policy)?)),
        None => Err(FrameError::UnknownCommand {
            command: command_char,
            data: data.to_string(),
        }),
    }
}

/// Interpret LOAD data: the `Space` token or the first character.
///
/// The token matches in any ASCII case. The Arduino sender only ever emits
/// `Space` or `space`; `SPACE` and mixed forms are accepted here as well.
fn parse_load_data(data: &str) -> char {
    if data.eq_ignore_ascii_case(SPACE_TOKEN) {
        return ' ';
    }
    // Callers guarantee non-empty data.
    data.chars().next().unwrap_or(' ')
}

/// Parse MAP data according to the rotation policy.
pub fn parse_rotation(data: &str, policy: RotationPolicy) -> FrameResult<i32> {
    match policy {
        RotationPolicy::Permissive => Ok(atoi(data)),
        RotationPolicy::Strict => data.trim().parse::<i32>().map_err(|_| FrameError::InvalidRotation {
            data: data.to_string(),
        }),
    }
}

/// Leading-integer parse: whitespace, optional sign, digits. Saturates at the
/// `i32` bounds and yields `0` when no digits are present.
fn atoi(data: &str) -> i32 {
    let s = data.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value * 10 + i64::from(b - b'0');
        if value > i64::from(i32::MAX) + 1 {
            break;
        }
    }

    let value = if negative { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
