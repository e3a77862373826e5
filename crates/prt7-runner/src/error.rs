//! Errors raised by the runner before or after a decoding session.

use std::path::PathBuf;

use prt7_decoder::{EncodeError, SourceError};
use thiserror::Error;

/// Errors that can occur while setting up or reporting a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot open source {source_name}: {error}")]
    OpenSource {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    #[error("line source error: {0}")]
    Source(#[from] SourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}
