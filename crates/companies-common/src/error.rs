//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while setting up shared infrastructure
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}")]
    InvalidLogFormat(String),

    #[error("Invalid log output: {0}")]
    InvalidLogOutput(String),

    #[error("Invalid log filter directive '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Logging already initialized: {0}")]
    LoggingInit(String),
}
