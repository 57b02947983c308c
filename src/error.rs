//! Error types for the MIDI-to-matrix preprocessor

use thiserror::Error;

/// Error type for preprocessing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreprocessError {
    /// E001: Byte stream is not a usable MIDI container (or decoding timed out)
    #[error("E001: Decode error - {0}")]
    Decode(String),
    /// E002: No track carries a pitched (non-percussion, non-effect) instrument
    #[error("E002: No valid track - {0}")]
    NoValidTrack(String),
    /// E003: The selected track has no notes once quantized
    #[error("E003: Empty track - {0}")]
    EmptyTrack(String),
    /// E004: Invalid configuration parameter
    #[error("E004: Invalid configuration parameter - {0}")]
    InvalidConfigParameter(String),
    /// E005: File I/O error
    #[error("E005: File I/O error - {0}")]
    FileError(String),
    /// E006: Matrix or report export error
    #[error("E006: Export error - {0}")]
    ExportError(String),
    /// E007: Batch cancelled before this document started
    #[error("E007: Cancelled")]
    Cancelled,
}

impl PreprocessError {
    /// Errors that only invalidate the current document; the batch carries on.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            PreprocessError::Decode(_)
                | PreprocessError::NoValidTrack(_)
                | PreprocessError::EmptyTrack(_)
        )
    }

    /// Short machine-readable code, e.g. "E001".
    pub fn code(&self) -> &'static str {
        match self {
            PreprocessError::Decode(_) => "E001",
            PreprocessError::NoValidTrack(_) => "E002",
            PreprocessError::EmptyTrack(_) => "E003",
            PreprocessError::InvalidConfigParameter(_) => "E004",
            PreprocessError::FileError(_) => "E005",
            PreprocessError::ExportError(_) => "E006",
            PreprocessError::Cancelled => "E007",
        }
    }
}

impl From<std::io::Error> for PreprocessError {
    fn from(err: std::io::Error) -> Self {
        PreprocessError::FileError(format!("File I/O error: {}", err))
    }
}

impl From<serde_json::Error> for PreprocessError {
    fn from(err: serde_json::Error) -> Self {
        PreprocessError::ExportError(format!("JSON serialization error: {}", err))
    }
}

impl From<midly::Error> for PreprocessError {
    fn from(err: midly::Error) -> Self {
        PreprocessError::Decode(err.to_string())
    }
}

/// Result type alias for preprocessing operations
pub type Result<T> = std::result::Result<T, PreprocessError>;
