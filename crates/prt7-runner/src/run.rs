//! Wiring between configuration, line sources and the decoding session.

use std::fs::File;
use std::io::{self, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use prt7_decoder::{
    encode_message, DecoderConfig, DecoderSession, LineSource, ReaderLineSource, SessionOutcome,
    StoppableLineSource,
};
use prt7_metrics::MetricsSnapshot;
use prt7_protocol::LineCodec;
use serde::Serialize;
use tracing::info;

use crate::config::{RunnerConfig, SourceConfig};
use crate::error::RunnerError;

/// Header printed above the decoded message.
pub const BANNER_HEADER: &str = " --- \n HIDDEN MESSAGE ASSEMBLED ";
/// Footer printed below the decoded message.
pub const BANNER_FOOTER: &str = " --- ";

/// Open the configured line source.
pub fn open_source(
    source: &SourceConfig,
    decoder: &DecoderConfig,
) -> Result<Box<dyn LineSource + Send>, RunnerError> {
    let codec = || LineCodec::with_max_line_length(decoder.max_line_length);
    let open_err = |error: io::Error| RunnerError::OpenSource {
        source_name: source.to_string(),
        error,
    };

    let boxed: Box<dyn LineSource + Send> = match source {
        SourceConfig::Path { path } => {
            let file = File::open(path).map_err(open_err)?;
            Box::new(ReaderLineSource::with_codec(file, codec()))
        }
        SourceConfig::Stdin => Box::new(ReaderLineSource::with_codec(io::stdin(), codec())),
        SourceConfig::Tcp {
            address,
            read_timeout_ms,
        } => {
            let stream = TcpStream::connect(address).map_err(open_err)?;
            stream
                .set_read_timeout(read_timeout_ms.map(Duration::from_millis))
                .map_err(open_err)?;
            Box::new(ReaderLineSource::with_codec(stream, codec()))
        }
    };

    info!("Listening for frames on {}", source);
    Ok(boxed)
}

/// Run one decoding session over an already-open source.
pub fn decode_from<S: LineSource>(
    source: S,
    decoder: &DecoderConfig,
    stop: Option<Arc<AtomicBool>>,
) -> SessionOutcome {
    let mut session = DecoderSession::new(decoder.clone());
    if let Some(stop) = stop {
        session = session.with_stop_flag(stop);
    }
    session.run(source);
    session.finish()
}

/// Open the configured source and decode from it.
///
/// With a stop flag the source is read on its own thread, so raising the
/// flag ends the session even while a read is blocked.
pub fn decode(
    config: &RunnerConfig,
    stop: Option<Arc<AtomicBool>>,
) -> Result<SessionOutcome, RunnerError> {
    let source = open_source(&config.source, &config.decoder)?;
    match stop {
        Some(stop) => {
            let source = StoppableLineSource::spawn(source, stop.clone())?;
            Ok(decode_from(source, &config.decoder, Some(stop)))
        }
        None => Ok(decode_from(source, &config.decoder, None)),
    }
}

/// Format the decoded message for the terminal.
pub fn render_message(outcome: &SessionOutcome, banner: bool) -> String {
    if banner {
        format!("{}\n{}\n{}", BANNER_HEADER, outcome.message, BANNER_FOOTER)
    } else {
        outcome.message.clone()
    }
}

/// Encode `text` into wire lines (one frame per line, no terminators).
pub fn encode_lines(text: &str, shift: i32, every: usize) -> Result<Vec<String>, RunnerError> {
    let frames = encode_message(text, shift, every)?;
    Ok(frames.iter().map(|f| f.to_line()).collect())
}

/// JSON report of one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// When the report was produced.
    pub decoded_at: DateTime<Utc>,
    /// Human-readable source description.
    pub source: String,
    /// Session result.
    #[serde(flatten)]
    pub outcome: SessionOutcome,
    /// Recorded metrics, when a recorder was installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSnapshot>,
}

impl Report {
    /// Build a report stamped with the current time.
    pub fn new(source: &SourceConfig, outcome: SessionOutcome) -> Self {
        Report {
            decoded_at: Utc::now(),
            source: source.to_string(),
            outcome,
            metrics: None,
        }
    }

    /// Attach a metrics snapshot.
    pub fn with_metrics(mut self, metrics: MetricsSnapshot) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Write the report as pretty JSON.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), RunnerError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write the report to a file.
    pub fn save(&self, path: &Path) -> Result<(), RunnerError> {
        let file = File::create(path)?;
        self.write_to(io::BufWriter::new(file))
    }
}
