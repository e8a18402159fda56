/*!
 * Error types for the mantra_tts application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a document run source (docx or pdf backend)
#[derive(Error, Debug)]
pub enum SourceError {
    /// The document could not be opened or its container is unreadable
    #[error("Failed to open document {path}: {message}")]
    Open {
        /// Path of the document
        path: PathBuf,
        /// Backend error description
        message: String,
    },

    /// The document opened but its content could not be parsed
    #[error("Failed to parse document content: {0}")]
    Parse(String),
}

/// Errors surfaced by a TTS backend
///
/// The two kinds are kept apart so the driver can log them differently;
/// both are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TtsError {
    /// Transport-level failure: unreachable host, timeout, throttling, 5xx
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered but produced no usable audio
    #[error("Generation error: {0}")]
    Generation(String),
}

/// Errors that can occur while synthesizing one passage
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The passage body was empty; it is never sent to the service
    #[error("Passage '{0}' has no text to synthesize")]
    EmptyInput(String),

    /// Transient network failure for a single attempt
    #[error("Network error: {0}")]
    Network(String),

    /// Generation failure for a single attempt (including zero-byte output)
    #[error("Generation error: {0}")]
    Generation(String),

    /// All attempts were used up
    #[error("Synthesis of '{title}' failed after {attempts} attempt(s): {last_error}")]
    Failed {
        /// Title of the passage
        title: String,
        /// Number of attempts made
        attempts: u32,
        /// Description of the last error seen
        last_error: String,
    },

    /// Cancellation was requested before the passage completed
    #[error("Synthesis cancelled")]
    Cancelled,

    /// Local file system failure while writing the artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TtsError> for SynthesisError {
    fn from(error: TtsError) -> Self {
        match error {
            TtsError::Network(message) => Self::Network(message),
            TtsError::Generation(message) => Self::Generation(message),
        }
    }
}

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value is out of range or malformed
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Input document type is not supported
    #[error("Unsupported file type '{0}': expected a .docx or .pdf file")]
    UnsupportedFormat(String),

    /// Output directory could not be created
    #[error("Failed to create output directory {path}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Error from a document backend
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Error from synthesis
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The run was cancelled
    #[error("Conversion cancelled")]
    Cancelled,

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
