//! # prt7-runner
//!
//! Command-line front end for the PRT-7 decoder. It loads configuration
//! (YAML file plus flag overrides), opens a line source, runs one decoding
//! session and prints the hidden message. It can also produce the frame
//! sequence for a plain message, which is handy for feeding test captures.

pub mod config;
pub mod error;
pub mod run;

pub use config::{RunnerConfig, SourceConfig, DEFAULT_DEVICE};
pub use error::RunnerError;
pub use run::{decode, decode_from, encode_lines, open_source, render_message, Report};
