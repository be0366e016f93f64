//! Error handling module for smarttrim

use thiserror::Error;

/// Main error type for smarttrim operations
#[derive(Error, Debug)]
pub enum TrimError {
    /// Media structure unusable for planning (no keyframes, bad duration)
    #[error("Invalid media: {message}")]
    InvalidMedia { message: String },

    /// Requested time range is empty or inverted
    #[error("Invalid time range: start ({start}) must be before end ({end})")]
    InvalidRange { start: String, end: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },

    /// Illegal request state transition
    #[error("Invalid request state: {message}")]
    InvalidState { message: String },

    /// Media probe error
    #[error("Failed to probe media file: {message}")]
    ProbeFailed { message: String },

    /// Transcode batch reported failure by the execution layer
    #[error("Transcode batch failed: {message}")]
    EncodeFailed { message: String },

    /// Stream-copy batch reported failure by the execution layer
    #[error("Stream-copy batch failed: {message}")]
    CopyFailed { message: String },

    /// Final concatenation reported failure by the execution layer
    #[error("Merge failed: {message}")]
    MergeFailed { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for smarttrim operations
pub type TrimResult<T> = std::result::Result<T, TrimError>;
