//! Unified error types for tunnelwatch

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tunnelwatch operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // Config errors
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation failed: {0}")]
    ConfigValidation(String),

    #[error("Failed to render config: {0}")]
    ConfigRender(#[from] serde_json::Error),

    // External command errors
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Command '{command}' timed out after {seconds} seconds")]
    CommandTimeout { command: String, seconds: u64 },

    // Probe errors
    #[error("Probe of '{target}' failed: {message}")]
    ProbeFailed { target: String, message: String },

    #[error("Unrecognized probe output: {0}")]
    ProbeOutput(String),

    // Task plumbing
    #[error("Classification handoff closed")]
    HandoffClosed,

    #[error("Watchdog task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for tunnelwatch operations
pub type Result<T> = std::result::Result<T, Error>;
