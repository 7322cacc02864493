//! Sequential batch orchestration
//!
//! Inputs are processed one at a time in the order the user gave them.
//! Individual mode writes one `<stem>_converted.pdf` per input; merge mode
//! converts into a staging directory and concatenates everything that
//! succeeded into `<base>_merged.pdf`. A failed file is reported and skipped,
//! never aborting the batch. Destination existence is checked before any
//! write.

use std::path::{Path, PathBuf};

use lopdf::Document;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::convert::Converter;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::manifest::{
    check_destination, individual_output_path, merged_output_path, BatchReport, OverwritePolicy,
    SourceFile, DEFAULT_MERGE_BASE,
};
use crate::pdf::{merge_pdfs, MergeOptions};

/// How the batch's outputs are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// One `<stem>_converted.pdf` per input
    Individual,
    /// A single `<base>_merged.pdf` containing every page in order
    Merge { base_name: String },
}

/// Everything a batch run needs.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Inputs in user order
    pub inputs: Vec<PathBuf>,
    /// Directory the final PDFs are written to
    pub output_dir: PathBuf,
    pub mode: OutputMode,
    pub overwrite: OverwritePolicy,
    /// Explicit font for native text rendering
    pub font_file: Option<PathBuf>,
}

impl BatchOptions {
    pub fn individual(inputs: Vec<PathBuf>, output_dir: PathBuf) -> Self {
        Self {
            inputs,
            output_dir,
            mode: OutputMode::Individual,
            overwrite: OverwritePolicy::Refuse,
            font_file: None,
        }
    }

    pub fn merge(inputs: Vec<PathBuf>, output_dir: PathBuf, base_name: Option<String>) -> Self {
        Self {
            inputs,
            output_dir,
            mode: OutputMode::Merge {
                base_name: base_name.unwrap_or_else(|| DEFAULT_MERGE_BASE.to_string()),
            },
            overwrite: OverwritePolicy::Refuse,
            font_file: None,
        }
    }
}

/// Run a batch to completion and return the ordered report.
pub fn run_batch(options: &BatchOptions) -> Result<BatchReport> {
    preflight(options)?;

    let converter = Converter::new(options.font_file.clone());

    // Office inputs with no office suite is fatal before any work starts
    let needs_office = options
        .inputs
        .iter()
        .filter_map(|p| Format::from_path(p))
        .any(|f| f.needs_office());
    if needs_office && converter.office().is_none() {
        return Err(Error::ConverterNotFound);
    }

    std::fs::create_dir_all(&options.output_dir)?;

    match &options.mode {
        OutputMode::Individual => run_individual(options, &converter),
        OutputMode::Merge { base_name } => run_merge(options, &converter, base_name),
    }
}

fn preflight(options: &BatchOptions) -> Result<()> {
    if options.inputs.is_empty() {
        return Err(Error::NoInputs);
    }
    if let OutputMode::Merge { .. } = options.mode {
        if options.inputs.len() < 2 {
            return Err(Error::General(
                "merge mode requires at least two input files".to_string(),
            ));
        }
    }
    Ok(())
}

fn run_individual(options: &BatchOptions, converter: &Converter) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    // Conversions land here first so the suffix naming and overwrite policy
    // are applied on our side, not LibreOffice's
    let staging = TempDir::new()?;

    for (order, input) in options.inputs.iter().enumerate() {
        let source = SourceFile::new(order, input.clone());
        let destination = individual_output_path(&options.output_dir, input);

        let outcome = convert_one_individual(
            converter,
            &source,
            &destination,
            staging.path(),
            options.overwrite,
        );

        match outcome {
            Ok(()) => {
                info!(output = %destination.display(), "wrote");
                report.outputs.push(destination.clone());
                report.push_success(source, destination);
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "skipping failed input");
                report.push_failure(source, e.to_string());
            }
        }
    }

    Ok(report)
}

/// Convert one input and move the result to its final destination.
fn convert_one_individual(
    converter: &Converter,
    source: &SourceFile,
    destination: &Path,
    staging: &Path,
    overwrite: OverwritePolicy,
) -> Result<()> {
    // Surface the overwrite conflict before spending any conversion work
    check_destination(destination, overwrite)?;

    let produced = match source.format {
        Some(Format::Pdf) => validate_pdf_input(&source.path)?,
        Some(_) => converter.convert_to_pdf(&source.path, staging)?,
        None => {
            return Err(Error::UnsupportedFormat {
                path: source.path.clone(),
                extension: source
                    .path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })
        }
    };

    // Re-check: a file may have appeared while the conversion ran
    check_destination(destination, overwrite)?;
    std::fs::copy(&produced, destination)?;
    Ok(())
}

fn run_merge(
    options: &BatchOptions,
    converter: &Converter,
    base_name: &str,
) -> Result<BatchReport> {
    let destination = merged_output_path(&options.output_dir, base_name);
    check_destination(&destination, options.overwrite)?;

    let mut report = BatchReport::default();
    let staging = TempDir::new()?;
    let mut converted: Vec<PathBuf> = Vec::new();

    for (order, input) in options.inputs.iter().enumerate() {
        let source = SourceFile::new(order, input.clone());

        let produced = match source.format {
            Some(Format::Pdf) => validate_pdf_input(input),
            Some(_) => converter.convert_to_pdf(input, staging.path()),
            None => Err(Error::UnsupportedFormat {
                path: input.clone(),
                extension: input
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }),
        };

        match produced {
            Ok(pdf) => {
                converted.push(pdf.clone());
                report.push_success(source, pdf);
            }
            Err(e) => {
                warn!(input = %input.display(), error = %e, "skipping failed input");
                report.push_failure(source, e.to_string());
            }
        }
    }

    if converted.is_empty() {
        return Err(Error::General(
            "nothing to merge: every input failed to convert".to_string(),
        ));
    }

    // The destination may have appeared while conversions ran
    check_destination(&destination, options.overwrite)?;
    merge_pdfs(&MergeOptions {
        inputs: converted,
        output: destination.clone(),
    })?;

    info!(output = %destination.display(), "wrote merged PDF");
    report.outputs.push(destination);
    Ok(report)
}

/// A passthrough PDF must load and contain at least one page. Catching a
/// corrupt file here keeps the failure on its own report entry instead of
/// surfacing later, where it would abort the final merge.
fn validate_pdf_input(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let doc = Document::load(path)?;
    if doc.get_pages().is_empty() {
        return Err(Error::EmptyPdf(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

/// Open a file with the system default application.
pub fn open_path(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_rejected() {
        let options = BatchOptions::individual(vec![], PathBuf::from("/tmp/out"));
        assert!(matches!(run_batch(&options), Err(Error::NoInputs)));
    }

    #[test]
    fn merge_requires_two_inputs() {
        let options = BatchOptions::merge(
            vec![PathBuf::from("one.pdf")],
            PathBuf::from("/tmp/out"),
            None,
        );
        assert!(matches!(run_batch(&options), Err(Error::General(_))));
    }

    // Full batch flows are covered in tests/integration.rs
}
