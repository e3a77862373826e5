//! Decoding session: owns the rotor and the message, drives the line source.
//!
//! ```text
//! Idle --new--> Active --source done/budget/stop--> Done
//! ```
//!
//! Every line is parsed and applied in arrival order. Lines that fail to
//! parse are logged, counted and skipped; only the line source itself can end
//! a session early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use prt7_metrics::{metric_defs, metrics};
use prt7_protocol::{parse_frame, Frame, FrameError, RotationPolicy, MAX_LINE_LENGTH};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::message::MessageBuffer;
use crate::processor::{apply, Applied};
use crate::rotor::RotorWheel;
use crate::error::SourceError;
use crate::source::LineSource;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a decoding session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Stop after this many line reads (`None` = until the source ends).
    pub max_lines: Option<usize>,
    /// How MAP frames with non-numeric data are handled.
    pub rotation_policy: RotationPolicy,
    /// Bytes kept per line when reassembling from a byte stream.
    pub max_line_length: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            max_lines: None,
            rotation_policy: RotationPolicy::default(),
            max_line_length: MAX_LINE_LENGTH,
        }
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Before construction; [`DecoderSession::new`] moves straight to `Active`.
    Idle,
    /// Ready for, or processing, lines.
    Active,
    /// `run` has returned; no more lines will be pulled.
    Done,
}

/// Why a session stopped pulling lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SessionEnd {
    /// The line source reported end of input.
    Exhausted,
    /// The configured line budget was used up.
    BudgetReached,
    /// The stop flag was raised.
    Stopped,
    /// The line source failed; the error text is kept for reporting.
    SourceFailed(String),
}

/// Counters describing one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Lines pulled from the source.
    pub lines_received: u64,
    /// LOAD frames applied.
    pub loads_applied: u64,
    /// MAP frames applied.
    pub maps_applied: u64,
    /// Lines rejected as malformed.
    pub malformed: u64,
    /// Lines with an unknown command.
    pub unknown_commands: u64,
    /// MAP frames rejected under the strict rotation policy.
    pub invalid_rotations: u64,
}

impl SessionStats {
    /// Frames successfully applied.
    pub fn frames_applied(&self) -> u64 {
        self.loads_applied + self.maps_applied
    }

    /// Lines skipped for any reason.
    pub fn frames_rejected(&self) -> u64 {
        self.malformed + self.unknown_commands + self.invalid_rotations
    }

    fn record_applied(&mut self, frame: &Frame) {
        match frame {
            Frame::Load(_) => self.loads_applied += 1,
            Frame::Map(_) => self.maps_applied += 1,
        }
    }

    fn record_rejected(&mut self, err: &FrameError) {
        match err {
            FrameError::MalformedFrame { .. } => self.malformed += 1,
            FrameError::UnknownCommand { .. } => self.unknown_commands += 1,
            FrameError::InvalidRotation { .. } => self.invalid_rotations += 1,
        }
    }
}

/// Final result of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    /// The assembled message (possibly empty).
    pub message: String,
    /// Session counters.
    pub stats: SessionStats,
    /// Why line reading stopped, if `run` was used.
    pub end: Option<SessionEnd>,
}

// ============================================================================
// Decoder Session
// ============================================================================

/// One decoding run from a rotor at rest to a rendered message.
#[derive(Debug)]
pub struct DecoderSession {
    config: DecoderConfig,
    wheel: RotorWheel,
    buffer: MessageBuffer,
    state: SessionState,
    stats: SessionStats,
    end: Option<SessionEnd>,
    stop: Option<Arc<AtomicBool>>,
}

impl Default for DecoderSession {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl DecoderSession {
    /// Create a session with the rotor at rest and an empty message.
    pub fn new(config: DecoderConfig) -> Self {
        DecoderSession {
            config,
            wheel: RotorWheel::new(),
            buffer: MessageBuffer::new(),
            state: SessionState::Active,
            stats: SessionStats::default(),
            end: None,
            stop: None,
        }
    }

    /// Attach a flag that, once set, makes [`run`](Self::run) stop between lines.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the rotor.
    pub fn wheel(&self) -> &RotorWheel {
        &self.wheel
    }

    /// Get the message decoded so far.
    pub fn message(&self) -> &MessageBuffer {
        &self.buffer
    }

    /// Get the session counters.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Parse and apply one raw line.
    ///
    /// A line that fails to parse leaves the rotor and message untouched; the
    /// error is returned for inspection but is never fatal.
    pub fn feed_line(&mut self, line: &str) -> Result<Applied, FrameError> {
        self.stats.lines_received += 1;
        metrics::counter!(metric_defs::LINES_RECEIVED.name).increment(1);
        debug!("Frame received: [{}]", line.trim_end());

        match parse_frame(line, self.config.rotation_policy) {
            Ok(frame) => Ok(self.apply_frame(frame)),
            Err(err) => {
                warn!("skipping frame: {}", err);
                self.stats.record_rejected(&err);
                metrics::counter!(metric_defs::FRAMES_REJECTED.name, "reason" => err.kind())
                    .increment(1);
                Err(err)
            }
        }
    }

    /// Apply an already-parsed frame.
    pub fn apply_frame(&mut self, frame: Frame) -> Applied {
        let applied = apply(frame, &mut self.wheel, &mut self.buffer);
        self.stats.record_applied(&frame);

        match applied {
            Applied::Decoded { input, output } => {
                trace!("LOAD {:?} -> {:?}", input, output);
                metrics::counter!(metric_defs::FRAMES_APPLIED.name, "command" => "load")
                    .increment(1);
                metrics::counter!(metric_defs::CHARS_DECODED.name).increment(1);
            }
            Applied::Rotated { by, origin } => {
                trace!("MAP {:+} -> origin {:?}", by, origin);
                metrics::counter!(metric_defs::FRAMES_APPLIED.name, "command" => "map")
                    .increment(1);
                metrics::gauge!(metric_defs::ROTOR_OFFSET.name).set(f64::from(self.wheel.offset()));
                metrics::histogram!(metric_defs::ROTATION_MAGNITUDE.name)
                    .record(f64::from(by).abs());
            }
        }

        applied
    }

    /// Pull lines from `source` until it ends, the line budget is used up,
    /// or the stop flag is raised.
    ///
    /// Calling `run` again after it returned does nothing and repeats the
    /// original end reason.
    pub fn run<S: LineSource>(&mut self, mut source: S) -> SessionEnd {
        if let Some(end) = &self.end {
            return end.clone();
        }

        let mut reads = 0usize;
        let end = loop {
            if self.stop_requested() {
                break SessionEnd::Stopped;
            }
            if self.config.max_lines.is_some_and(|max| reads >= max) {
                break SessionEnd::BudgetReached;
            }

            reads += 1;
            match source.next_line() {
                Ok(Some(line)) => {
                    // Rejections are already logged and counted.
                    let _ = self.feed_line(&line);
                }
                Ok(None) => break SessionEnd::Exhausted,
                Err(SourceError::Stopped) => break SessionEnd::Stopped,
                Err(e) => {
                    warn!("line source failed: {}", e);
                    break SessionEnd::SourceFailed(e.to_string());
                }
            }
        };

        info!(
            "session ended ({:?}): {} lines, {} frames applied, {} rejected",
            end,
            self.stats.lines_received,
            self.stats.frames_applied(),
            self.stats.frames_rejected()
        );
        self.state = SessionState::Done;
        self.end = Some(end.clone());
        end
    }

    /// Finish the session and hand out the assembled message.
    pub fn finish(self) -> SessionOutcome {
        SessionOutcome {
            message: self.buffer.into_string(),
            stats: self.stats,
            end: self.end,
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
