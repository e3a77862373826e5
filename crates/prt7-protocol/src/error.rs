//! Error types for the PRT-7 protocol.

use thiserror::Error;

/// Errors that can occur when parsing a PRT-7 frame line.
///
/// None of these are fatal to a decoding session: the offending line is
/// skipped and decoding continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The line does not follow the `<CMD>,<DATA>` grammar.
    #[error("malformed frame {line:?}: {reason}")]
    MalformedFrame {
        /// The offending line, with terminators stripped.
        line: String,
        /// What part of the grammar was violated.
        reason: MalformedReason,
    },

    /// The command character is neither `L` nor `M`.
    #[error("unknown command {command:?} (data {data:?})")]
    UnknownCommand {
        /// The command character as received.
        command: char,
        /// The data field that accompanied it.
        data: String,
    },

    /// MAP data is not an integer (strict rotation policy only).
    #[error("invalid rotation amount {data:?}")]
    InvalidRotation {
        /// The data field that failed to parse.
        data: String,
    },
}

impl FrameError {
    /// Short, stable label for the error kind (used for metrics and reports).
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::MalformedFrame { .. } => "malformed",
            FrameError::UnknownCommand { .. } => "unknown_command",
            FrameError::InvalidRotation { .. } => "invalid_rotation",
        }
    }
}

/// The specific grammar violation behind a [`FrameError::MalformedFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Nothing was received.
    Empty,
    /// No `,` delimiter present.
    MissingDelimiter,
    /// The delimiter is the first character.
    EmptyCommand,
    /// The delimiter is the last character.
    EmptyData,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::Empty => write!(f, "empty line"),
            MalformedReason::MissingDelimiter => write!(f, "missing ',' delimiter"),
            MalformedReason::EmptyCommand => write!(f, "empty command"),
            MalformedReason::EmptyData => write!(f, "empty data"),
        }
    }
}

/// Result type alias for frame parsing.
pub type FrameResult<T> = Result<T, FrameError>;
