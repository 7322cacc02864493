//! Nimar PDF Library
//!
//! A cross-platform library for converting heterogeneous documents to PDF
//! and merging them. This library provides functionality to:
//! - Detect supported input formats by extension
//! - Convert office documents via headless LibreOffice
//! - Render text, CSV, Markdown, XML and images to PDF natively, with full
//!   complex-script shaping (including Devanagari)
//! - Merge PDFs preserving page order and embedded fonts
//! - Inspect PDFs (page counts, metadata, text extraction)
//!
//! # Example
//!
//! ```no_run
//! use nimar_pdf::pipeline::{run_batch, BatchOptions};
//! use std::path::PathBuf;
//!
//! let options = BatchOptions::merge(
//!     vec![
//!         PathBuf::from("1. intro.docx"),
//!         PathBuf::from("2. notes.txt"),
//!     ],
//!     PathBuf::from("out"),
//!     Some("bundle".to_string()),
//! );
//!
//! let report = run_batch(&options).expect("batch failed");
//! assert_eq!(report.converted_count(), 2);
//! ```

pub mod convert;
pub mod error;
pub mod format;
pub mod manifest;
pub mod pdf;
pub mod pipeline;
pub mod render;

// Re-export commonly used items
pub use error::{Error, Result};
pub use format::Format;
pub use manifest::{BatchReport, OverwritePolicy};
pub use pipeline::{run_batch, BatchOptions, OutputMode};
