//! Metrics infrastructure for the PRT-7 decoder.
//!
//! This crate describes every metric the decoder emits. It re-exports the
//! `metrics` crate for convenience and defines each metric as a structured
//! [`Metric`] constant to avoid typos and keep metadata next to the name.
//!
//! Without an installed recorder every emission is a no-op, so the decoder
//! library can emit unconditionally. [`InMemoryRecorder`] collects the values
//! for the runner's report and for tests.
//!
//! # Example
//!
//! ```rust
//! use prt7_metrics::{metric_defs, InMemoryRecorder};
//!
//! let recorder = InMemoryRecorder::new();
//! metrics::with_local_recorder(&recorder, || {
//!     metrics::counter!(metric_defs::FRAMES_APPLIED.name, "command" => "load").increment(1);
//! });
//!
//! let snapshot = recorder.snapshot();
//! assert_eq!(snapshot.counter(metric_defs::FRAMES_APPLIED.name, &[("command", "load")]), 1);
//! ```

mod recorder;

pub use metrics;
pub use recorder::{HistogramSummary, InMemoryRecorder, MetricsSnapshot};

use metrics::{KeyName, SharedString, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

/// A metric name together with the metadata handed to the recorder.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "prt7.session.lines_received").
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
}

impl Metric {
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Hand this metric's unit and description to the installed recorder.
    pub fn describe(&self) {
        let key = KeyName::from_const_str(self.name);
        let description = SharedString::const_str(self.description);
        metrics::with_recorder(|recorder| match self.kind {
            MetricKind::Counter => recorder.describe_counter(key, self.unit, description),
            MetricKind::Gauge => recorder.describe_gauge(key, self.unit, description),
            MetricKind::Histogram => recorder.describe_histogram(key, self.unit, description),
        });
    }
}

/// All metric definitions for the decoder.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Raw lines pulled from the line source.
    pub const LINES_RECEIVED: Metric = Metric::counter("prt7.session.lines_received")
        .with_description("Raw lines received from the line source")
        .with_unit(Unit::Count);

    /// Frames parsed and applied, labelled `command` (`load` or `map`).
    pub const FRAMES_APPLIED: Metric = Metric::counter("prt7.session.frames_applied")
        .with_description("Frames parsed and applied to the rotor or message")
        .with_unit(Unit::Count);

    /// Lines skipped because they failed to parse, labelled `reason`
    /// (`malformed`, `unknown_command`, `invalid_rotation`).
    pub const FRAMES_REJECTED: Metric = Metric::counter("prt7.session.frames_rejected")
        .with_description("Lines skipped because they failed to parse")
        .with_unit(Unit::Count);

    /// Characters appended to the message buffer.
    pub const CHARS_DECODED: Metric = Metric::counter("prt7.message.chars_decoded")
        .with_description("Characters appended to the decoded message")
        .with_unit(Unit::Count);

    /// Current rotor offset (0-25) relative to rest.
    pub const ROTOR_OFFSET: Metric = Metric::gauge("prt7.rotor.offset")
        .with_description("Rotor origin offset from 'A' after the last MAP frame");

    /// Magnitude of MAP rotations.
    pub const ROTATION_MAGNITUDE: Metric = Metric::histogram("prt7.rotor.rotation_magnitude")
        .with_description("Absolute rotation requested by MAP frames")
        .with_unit(Unit::Count);

    /// All metrics, for bulk description.
    pub const ALL: &[&Metric] = &[
        &LINES_RECEIVED,
        &FRAMES_APPLIED,
        &FRAMES_REJECTED,
        &CHARS_DECODED,
        &ROTOR_OFFSET,
        &ROTATION_MAGNITUDE,
    ];
}

/// Describes all decoder metrics to the installed recorder.
///
/// Call once at startup, after [`metrics::set_global_recorder`].
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
