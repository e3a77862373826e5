//! PRT-7 decoder binary.
//!
//! # Usage
//!
//! ```bash
//! # Decode from the default serial device, one sketch cycle
//! prt7 decode --max-lines 14
//!
//! # Decode a saved capture with a YAML config and a JSON report
//! prt7 --config prt7.yaml decode capture.txt --report report.json
//!
//! # Produce frames for a message
//! prt7 encode "HOLA MUNDO" --shift 2 --every 5
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use prt7_decoder::RotationPolicy;
use prt7_metrics::InMemoryRecorder;
use prt7_runner::{decode, encode_lines, render_message, Report, RunnerConfig, SourceConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// PRT-7 rotor cipher decoder
#[derive(Parser, Debug)]
#[command(name = "prt7")]
#[command(about = "Decode PRT-7 frame streams from a serial link")]
#[command(version)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode frames from a device, file, stdin (`-`) or `tcp://host:port`
    Decode {
        /// Line source (defaults to the config file, then /dev/ttyUSB0)
        source: Option<String>,

        /// Stop after this many line reads
        #[arg(short = 'n', long)]
        max_lines: Option<usize>,

        /// Reject MAP frames whose offset is not an integer
        #[arg(long)]
        strict: bool,

        /// Print only the message, without header and footer
        #[arg(long)]
        no_banner: bool,

        /// Write a JSON report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the frame lines that encode a message
    Encode {
        /// Message to send (A-Z and spaces; lowercase is uppercased)
        text: String,

        /// Rotation applied by each MAP frame
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i32,

        /// Emit a MAP frame before every N characters
        #[arg(long, default_value_t = 1)]
        every: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RunnerConfig::from_file(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match args.command {
        Commands::Decode {
            source,
            max_lines,
            strict,
            no_banner,
            report,
        } => {
            if let Some(source) = source {
                config.source = SourceConfig::from_arg(&source);
            }
            if max_lines.is_some() {
                config.decoder.max_lines = max_lines;
            }
            if strict {
                config.decoder.rotation_policy = RotationPolicy::Strict;
            }
            if no_banner {
                config.banner = false;
            }
            if report.is_some() {
                config.report = report;
            }
            config.validate()?;

            let recorder = Arc::new(InMemoryRecorder::new());
            if prt7_metrics::metrics::set_global_recorder(recorder.clone()).is_ok() {
                prt7_metrics::describe_metrics();
            }
            run_decode(&config, &recorder)
        }
        Commands::Encode { text, shift, every } => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for line in encode_lines(&text, shift, every)? {
                writeln!(out, "{}", line)?;
            }
            Ok(())
        }
    }
}

fn run_decode(
    config: &RunnerConfig,
    recorder: &InMemoryRecorder,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("=== PRT-7 decoder ===");

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })?;

    let outcome = decode(config, Some(stop))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", render_message(&outcome, config.banner))?;

    let snapshot = recorder.snapshot();
    for (name, value) in &snapshot.counters {
        tracing::debug!("{} = {}", name, value);
    }

    if let Some(path) = &config.report {
        Report::new(&config.source, outcome)
            .with_metrics(snapshot)
            .save(path)?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(())
}
