// Recoverable error types for a run.
//
// Only `ConfigError` (see config.rs) aborts a run. Everything here is logged,
// counted in the run summary and otherwise skipped.

use crate::discovery::ToolKind;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A single (domain, tool) invocation failed; that pair contributes no candidates.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch {tool} for {domain}: {source}")]
    Spawn {
        tool: ToolKind,
        domain: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status} for {domain}")]
    NonZeroExit {
        tool: ToolKind,
        domain: String,
        status: String,
    },

    #[error("{tool} timed out after {timeout:?} for {domain}")]
    Timeout {
        tool: ToolKind,
        domain: String,
        timeout: Duration,
    },

    #[error("failed to prepare or write artifact {path} for {tool}: {source}")]
    Artifact {
        tool: ToolKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// An artifact could not be parsed; its rows are skipped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read artifact: {0}")]
    Io(#[from] io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("expected column '{0}' not found in header")]
    MissingColumn(String),
}

/// Deleting an artifact failed. Logged only.
#[derive(Debug, Error)]
#[error("failed to remove temporary file {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}
