//! Error types for numberscope.
//!
//! Library crates use [`NumberScopeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Provider failures are deliberately absent here: they are carried as data
//! inside [`crate::ProviderResult`] and never abort a request.

use std::path::PathBuf;

/// Top-level error type for all numberscope operations.
#[derive(Debug, thiserror::Error)]
pub enum NumberScopeError {
    /// Configuration loading or validation error. Fatal at startup.
    #[error("config error: {message}")]
    Config { message: String },

    /// No phone number candidate was located in the input text.
    #[error("no phone number found in input")]
    NoNumberFound,

    /// A candidate could not be parsed as a phone number.
    #[error("invalid number format: {message}")]
    InvalidNumberFormat { message: String },

    /// Network/HTTP error outside of a provider lookup (e.g. client construction).
    #[error("network error: {0}")]
    Network(String),

    /// Provider registry or setup error.
    #[error("provider error: {0}")]
    Provider(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad region hint, malformed mapping, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NumberScopeError>;

impl NumberScopeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-format error from any displayable message.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidNumberFormat {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
