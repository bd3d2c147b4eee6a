//! Error types for pdfdeck library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfdeck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout reconstruction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The page dump could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Page geometry is unusable (zero, negative or non-finite size).
    #[error("Invalid page {page}: {reason}")]
    InvalidPage { page: u32, reason: String },

    /// A primitive record is malformed.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Chart region could not be rasterized.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Configuration could not be applied.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during rendering (JSON output).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Malformed page range string.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),
}
