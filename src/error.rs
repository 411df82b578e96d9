// src/error.rs

//! Crate-wide error type for the conversion pipeline.
//!
//! Each pipeline stage has its own variant so callers can tell where a
//! failure originated. Per-unit failures are normally downgraded before they
//! reach this type (degraded IR records, zero-automation components); these
//! variants surface only at stage boundaries that cannot degrade further.

use thiserror::Error;

/// Errors produced by the conversion pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// File could not be decoded into text by any strategy
    #[error("Decode error: {0}")]
    Decode(String),

    /// A package or unit could not be parsed into IR
    #[error("Parse error: {0}")]
    Parse(String),

    /// A generator failed to emit component XML
    #[error("Generation error: {0}")]
    Generation(String),

    /// Generated XML failed a structural validation check
    #[error("Validation error: {0}")]
    Validation(String),

    /// Publishing a component to the target platform failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// Platform configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// Underlying filesystem operation failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Convenience result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
