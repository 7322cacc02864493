//! Error types for the nimar-pdf library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the nimar-pdf library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// File not found
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Extension is not one of the supported input formats
    #[error("unsupported file format '{extension}': {}", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// LibreOffice could not be located on this system
    #[error("LibreOffice not found; install it or add soffice to PATH (see `nimar-pdf check`)")]
    ConverterNotFound,

    /// A single conversion failed
    #[error("conversion failed for {}: {reason}", .path.display())]
    Conversion { path: PathBuf, reason: String },

    /// External conversion exceeded the time limit
    #[error("conversion timed out after {seconds}s: {}", .path.display())]
    ConversionTimeout { path: PathBuf, seconds: u64 },

    /// Destination already exists and overwrite was not requested
    #[error("destination already exists (pass --force to overwrite): {}", .0.display())]
    DestinationExists(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// No input files provided
    #[error("no input files provided")]
    NoInputs,

    /// Font error
    #[error("font error: {0}")]
    Font(String),

    /// General error
    #[error("{0}")]
    General(String),
}
