//! Error handling module for the montage pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for montage generation
#[derive(Error, Debug)]
pub enum MontageError {
    /// The input has no decodable video stream
    #[error("No video stream found in file: {path}")]
    NoVideoStream { path: PathBuf },

    /// Skip percentages, grid dimensions or clip counts are unusable
    #[error("Invalid range: {reason}")]
    InvalidRange { reason: String },

    /// No keyframe could be located for a sample
    #[error("Could not find any keyframe near {timestamp:.2}s in {path}")]
    NoKeyframeFound { path: PathBuf, timestamp: f64 },

    /// Thumbnail height cannot be derived from the video aspect ratio
    #[error("Cannot derive thumbnail height for {path}: video is {width}x{height}")]
    ZeroHeight {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    /// A grid layout cell does not fit inside the grid
    #[error(
        "Cell at row {row}, col {col} with span {row_span}x{col_span} is outside the {rows}x{cols} grid"
    )]
    OutOfBounds {
        row: i64,
        col: i64,
        row_span: i64,
        col_span: i64,
        rows: u32,
        cols: u32,
    },

    /// The image codec failed to encode the montage
    #[error("Failed to encode {format}: {message}")]
    Encoding { format: &'static str, message: String },

    /// The media decoder failed to open, seek or decode
    #[error("Decoder error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Configuration file or value is invalid
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// The output file exists and overwriting is disabled
    #[error("File already exists (use --overwrite to force): {path}")]
    OutputExists { path: PathBuf },

    /// An extraction task did not complete
    #[error("Extraction worker failed: {message}")]
    Worker { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MontageError {
    /// Build an `InvalidRange` error from any displayable reason
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        MontageError::InvalidRange {
            reason: reason.into(),
        }
    }

    /// Build a `Config` error from any displayable message
    pub fn config(message: impl Into<String>) -> Self {
        MontageError::Config {
            message: message.into(),
        }
    }

    /// Build a `Decode` error for the given input
    pub fn decode(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        MontageError::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for montage operations
pub type MontageResult<T> = std::result::Result<T, MontageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = MontageError::NoKeyframeFound {
            path: PathBuf::from("/videos/a.mp4"),
            timestamp: 12.345,
        };
        assert_eq!(
            err.to_string(),
            "Could not find any keyframe near 12.35s in /videos/a.mp4"
        );

        let err = MontageError::OutOfBounds {
            row: 2,
            col: 0,
            row_span: 2,
            col_span: 1,
            rows: 3,
            cols: 3,
        };
        assert!(err.to_string().contains("3x3 grid"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MontageError = io.into();
        assert!(matches!(err, MontageError::Io(_)));
    }
}
