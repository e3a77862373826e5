//! Sender side: turn a plain message into a PRT-7 frame sequence.
//!
//! The encoder keeps its own rotor in lockstep with the one the receiver
//! will build, so every LOAD symbol it emits decodes back to the intended
//! character.

use prt7_protocol::Frame;

use crate::error::EncodeError;
use crate::rotor::RotorWheel;

/// Stateful frame builder mirroring a receiver's rotor.
#[derive(Debug, Clone, Default)]
pub struct FrameEncoder {
    wheel: RotorWheel,
    frames: Vec<Frame>,
}

impl FrameEncoder {
    /// Start with the rotor at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a MAP frame and rotate the mirror rotor.
    pub fn rotate(&mut self, n: i32) -> &mut Self {
        self.wheel.rotate(n);
        self.frames.push(Frame::Map(n));
        self
    }

    /// Emit a LOAD frame that decodes to `plain`.
    pub fn load(&mut self, plain: char) -> Result<&mut Self, EncodeError> {
        if plain != ' ' && !plain.is_ascii_uppercase() {
            return Err(EncodeError::UnsupportedChar(plain));
        }
        self.frames.push(Frame::Load(self.wheel.encode(plain)));
        Ok(self)
    }

    /// Frames emitted so far.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Consume the encoder, returning the frame sequence.
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

/// Encode `text`, emitting a `MAP shift` frame before every `every` characters.
///
/// With `shift == 0` no MAP frames are emitted. Lowercase letters are
/// uppercased; anything else outside A-Z and space is rejected.
pub fn encode_message(text: &str, shift: i32, every: usize) -> Result<Vec<Frame>, EncodeError> {
    if every == 0 {
        return Err(EncodeError::ZeroInterval);
    }

    let mut encoder = FrameEncoder::new();
    for (i, c) in text.chars().enumerate() {
        if shift != 0 && i % every == 0 {
            encoder.rotate(shift);
        }
        encoder.load(c.to_ascii_uppercase())?;
    }
    Ok(encoder.into_frames())
}
