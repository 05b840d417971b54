//! Error types for DDS decoding.

use thiserror::Error;

use crate::header::FourCC;

/// Errors that can occur when decoding DDS files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] talus_common::Error),

    /// Invalid DDS magic.
    #[error("invalid DDS magic: expected 'DDS ', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Invalid DDS header.
    #[error("invalid DDS header: {0}")]
    InvalidHeader(String),

    /// Recognized FourCC tag with no decoder.
    #[error("unsupported texture format: {0}")]
    UnsupportedFormat(FourCC),

    /// Fewer bytes available than the pixel data requires.
    #[error("truncated DDS data: needed {needed} bytes but only {available} available")]
    Truncated { needed: usize, available: usize },
}

/// Result type for DDS operations.
pub type Result<T> = std::result::Result<T, Error>;
