//! Error types for line sources and the frame encoder.

use thiserror::Error;

/// Errors produced by a [`LineSource`](crate::LineSource).
///
/// A source error ends the session; it is reported in the outcome rather
/// than treated as a decode failure.
#[derive(Debug, Error)]
pub enum SourceError {
    /// I/O error while reading from the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source gave up waiting for data.
    #[error("timed out waiting for a line")]
    Timeout,

    /// The stop flag was raised while waiting for a line.
    #[error("stopped while waiting for a line")]
    Stopped,
}

/// Errors that can occur when enciphering a message into frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The character is neither an uppercase letter nor a space.
    #[error("unsupported character {0:?}: only 'A'-'Z' and space can be sent")]
    UnsupportedChar(char),

    /// A rotation schedule needs a non-zero interval.
    #[error("rotation interval must be at least 1")]
    ZeroInterval,
}
