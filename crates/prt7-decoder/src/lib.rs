//! # prt7-decoder
//!
//! Decode engine for the PRT-7 serial protocol.
//!
//! The engine is a small rotor machine: a [`RotorWheel`] holding the A-Z
//! alphabet with a movable origin, a [`MessageBuffer`] collecting decoded
//! characters, and [`apply`] which dispatches each parsed frame onto them.
//! A [`DecoderSession`] owns one wheel and one buffer and pulls raw lines
//! from a [`LineSource`] until the source is exhausted or a line budget runs
//! out.
//!
//! ## Example
//!
//! ```rust
//! use prt7_decoder::{DecoderConfig, DecoderSession, IterLineSource};
//!
//! let mut session = DecoderSession::new(DecoderConfig::default());
//! session.run(IterLineSource::new(["M,2", "L,A", "L,Space", "garbage", "L,F"]));
//!
//! let outcome = session.finish();
//! assert_eq!(outcome.message, "C H");
//! assert_eq!(outcome.stats.malformed, 1);
//! ```

mod encoder;
mod error;
mod message;
mod processor;
mod rotor;
mod session;
mod source;

pub use encoder::{encode_message, FrameEncoder};
pub use error::{EncodeError, SourceError};
pub use message::MessageBuffer;
pub use processor::{apply, Applied};
pub use rotor::{RotorWheel, ALPHABET, ALPHABET_LEN};
pub use session::{
    DecoderConfig, DecoderSession, SessionEnd, SessionOutcome, SessionState, SessionStats,
};
pub use source::{
    IterLineSource, LineSource, ReaderLineSource, StoppableLineSource, STOP_POLL_INTERVAL,
};

pub use prt7_protocol::{Frame, FrameError, RotationPolicy};
