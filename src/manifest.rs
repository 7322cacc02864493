//! Output naming, overwrite policy and the batch report

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::format::Format;

/// Suffix applied to individually converted files
pub const CONVERTED_SUFFIX: &str = "_converted";
/// Suffix applied to the merged output
pub const MERGED_SUFFIX: &str = "_merged";
/// Default base name for merged output when the user gives none
pub const DEFAULT_MERGE_BASE: &str = "converted_files";

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Refuse with [`Error::DestinationExists`]
    #[default]
    Refuse,
    /// Replace the existing file
    Overwrite,
}

/// Destination path for an individually converted input:
/// `<out_dir>/<stem>_converted.pdf`.
pub fn individual_output_path(out_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    out_dir.join(format!("{stem}{CONVERTED_SUFFIX}.pdf"))
}

/// Destination path for the merged output: `<out_dir>/<base>_merged.pdf`.
/// A trailing `.pdf` on the base name is stripped first.
pub fn merged_output_path(out_dir: &Path, base: &str) -> PathBuf {
    let base = base.trim();
    let base = if base.is_empty() { DEFAULT_MERGE_BASE } else { base };
    let base = base
        .strip_suffix(".pdf")
        .or_else(|| base.strip_suffix(".PDF"))
        .unwrap_or(base);
    out_dir.join(format!("{base}{MERGED_SUFFIX}.pdf"))
}

/// Pre-write existence check. Errors unless the policy allows overwrite.
pub fn check_destination(dest: &Path, policy: OverwritePolicy) -> Result<()> {
    if dest.exists() && policy == OverwritePolicy::Refuse {
        return Err(Error::DestinationExists(dest.to_path_buf()));
    }
    Ok(())
}

/// One input file as the user ordered it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Position in the user-supplied ordering (0-based)
    pub order: usize,
    pub path: PathBuf,
    pub format: Option<Format>,
}

impl SourceFile {
    pub fn new(order: usize, path: PathBuf) -> Self {
        let format = Format::from_path(&path);
        Self { order, path, format }
    }
}

/// Outcome of one conversion job.
#[derive(Debug, Clone)]
pub enum JobStatus {
    /// Produced (or contributed) this PDF
    Converted(PathBuf),
    /// Failed; the batch continued without it
    Failed(String),
}

/// One entry per input, in input order.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub source: SourceFile,
    pub status: JobStatus,
}

/// Ordered record of everything a batch produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<ManifestEntry>,
    /// Final files written to the output directory, in order
    pub outputs: Vec<PathBuf>,
}

impl BatchReport {
    pub fn push_success(&mut self, source: SourceFile, output: PathBuf) {
        self.entries.push(ManifestEntry {
            source,
            status: JobStatus::Converted(output),
        });
    }

    pub fn push_failure(&mut self, source: SourceFile, reason: String) {
        self.entries.push(ManifestEntry {
            source,
            status: JobStatus::Failed(reason),
        });
    }

    pub fn converted_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, JobStatus::Converted(_)))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().filter_map(|e| match &e.status {
            JobStatus::Failed(reason) => Some((e.source.path.as_path(), reason.as_str())),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn individual_naming_uses_converted_suffix() {
        let out = individual_output_path(Path::new("/out"), Path::new("/in/report.docx"));
        assert_eq!(out, PathBuf::from("/out/report_converted.pdf"));
    }

    #[test]
    fn merged_naming_strips_trailing_pdf() {
        let out = merged_output_path(Path::new("/out"), "bundle.pdf");
        assert_eq!(out, PathBuf::from("/out/bundle_merged.pdf"));
    }

    #[test]
    fn merged_naming_defaults_when_empty() {
        let out = merged_output_path(Path::new("/out"), "  ");
        assert_eq!(out, PathBuf::from("/out/converted_files_merged.pdf"));
    }

    #[test]
    fn check_destination_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x_converted.pdf");
        std::fs::write(&dest, b"old").unwrap();

        let err = check_destination(&dest, OverwritePolicy::Refuse).unwrap_err();
        assert!(matches!(err, Error::DestinationExists(_)));

        check_destination(&dest, OverwritePolicy::Overwrite).unwrap();
        check_destination(&dir.path().join("fresh.pdf"), OverwritePolicy::Refuse).unwrap();
    }

    #[test]
    fn report_preserves_input_order() {
        let mut report = BatchReport::default();
        report.push_success(SourceFile::new(0, "a.txt".into()), "a_converted.pdf".into());
        report.push_failure(SourceFile::new(1, "b.zip".into()), "unsupported".into());
        report.push_success(SourceFile::new(2, "c.pdf".into()), "c_converted.pdf".into());

        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.converted_count(), 2);
        assert!(report.has_failures());
        let orders: Vec<usize> = report.entries.iter().map(|e| e.source.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }
}
