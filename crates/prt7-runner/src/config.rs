//! Runner configuration.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags. Every field has a default, so an empty file is valid:
//!
//! ```yaml
//! source:
//!   type: path
//!   path: /dev/ttyUSB0
//! decoder:
//!   max_lines: 14
//!   rotation_policy: permissive
//! log_level: info
//! banner: true
//! ```

use std::path::{Path, PathBuf};

use prt7_decoder::DecoderConfig;
use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// Device path used when nothing else is configured.
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// Where raw frame lines come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A file or an already-configured character device.
    Path {
        /// Filesystem path to read.
        path: PathBuf,
    },
    /// Standard input.
    Stdin,
    /// A TCP endpoint exposing the serial stream (e.g. a serial-to-network bridge).
    Tcp {
        /// `host:port` to connect to.
        address: String,
        /// Read timeout; a timed-out read ends the session.
        #[serde(default)]
        read_timeout_ms: Option<u64>,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Path {
            path: PathBuf::from(DEFAULT_DEVICE),
        }
    }
}

impl std::fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceConfig::Path { path } => write!(f, "{}", path.display()),
            SourceConfig::Stdin => write!(f, "stdin"),
            SourceConfig::Tcp { address, .. } => write!(f, "tcp://{}", address),
        }
    }
}

impl SourceConfig {
    /// Interpret a command-line source argument.
    ///
    /// `-` means stdin, `tcp://host:port` a TCP endpoint, anything else a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            SourceConfig::Stdin
        } else if let Some(address) = arg.strip_prefix("tcp://") {
            SourceConfig::Tcp {
                address: address.to_string(),
                read_timeout_ms: None,
            }
        } else {
            SourceConfig::Path {
                path: PathBuf::from(arg),
            }
        }
    }
}

/// Complete runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Line source.
    pub source: SourceConfig,
    /// Decoding session settings.
    pub decoder: DecoderConfig,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Frame the decoded message with a header and footer.
    pub banner: bool,
    /// Write a JSON report of the session to this path.
    pub report: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            source: SourceConfig::default(),
            decoder: DecoderConfig::default(),
            log_level: "info".to_string(),
            banner: true,
            report: None,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, RunnerError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RunnerConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the decoder cannot work with.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.decoder.max_line_length == 0 {
            return Err(RunnerError::Config(
                "decoder.max_line_length must be at least 1".to_string(),
            ));
        }
        if let SourceConfig::Tcp { address, .. } = &self.source {
            if address.is_empty() {
                return Err(RunnerError::Config("tcp source needs an address".to_string()));
            }
        }
        Ok(())
    }
}
