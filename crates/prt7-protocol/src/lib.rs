//! PRT-7 Serial Protocol
//!
//! This crate provides types and utilities for the PRT-7 line protocol used by
//! the Arduino/ESP32 sender. Every line on the wire is one frame of the form
//! `<CMD>,<DATA>`.
//!
//! # Protocol Overview
//!
//! - **LOAD frames** (`L,<char>`): carry one cipher-shifted character. The
//!   literal token `Space` stands for a blank.
//! - **MAP frames** (`M,<offset>`): carry a signed rotation for the decoder's
//!   rotor wheel.
//! - Lines are terminated with `\r\n` (Arduino `Serial.println`).
//!
//! Command characters are case-insensitive. Anything that does not fit the
//! grammar is reported as a [`FrameError`]; callers decide whether to skip it.
//!
//! # Example
//!
//! ```rust
//! use prt7_protocol::{parse_frame, Frame, RotationPolicy};
//!
//! let frame = parse_frame("M,-3", RotationPolicy::Permissive)?;
//! assert_eq!(frame, Frame::Map(-3));
//! assert_eq!(frame.to_line(), "M,-3");
//! # Ok::<(), prt7_protocol::FrameError>(())
//! ```

mod codec;
mod error;
mod frames;

pub use codec::*;
pub use error::*;
pub use frames::*;
