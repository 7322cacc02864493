//! Conversion engine: dispatches each input to the converter for its format

pub mod native;
pub mod office;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::render::FontCatalog;

pub use office::{install_instructions, OfficeConverter};

/// Dispatches inputs to LibreOffice or the native renderers.
pub struct Converter {
    office: Option<OfficeConverter>,
    fonts: FontCatalog,
}

impl Converter {
    /// Build a converter. LibreOffice absence is not an error here — it only
    /// matters once an office-format input shows up (the pipeline pre-flight
    /// enforces that).
    pub fn new(font_file: Option<PathBuf>) -> Self {
        let office = OfficeConverter::locate().ok();
        Self {
            office,
            fonts: FontCatalog::discover(font_file),
        }
    }

    pub fn office(&self) -> Option<&OfficeConverter> {
        self.office.as_ref()
    }

    pub fn fonts(&self) -> &FontCatalog {
        &self.fonts
    }

    /// Convert one input into `out_dir`, returning the produced PDF path.
    ///
    /// PDF inputs are not handled here; the pipeline decides whether to copy
    /// or pass them through.
    pub fn convert_to_pdf(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        if !input.exists() {
            return Err(Error::FileNotFound(input.to_path_buf()));
        }

        let format = Format::from_path(input).ok_or_else(|| Error::UnsupportedFormat {
            path: input.to_path_buf(),
            extension: input
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        })?;

        info!(input = %input.display(), converter = format.converter_name(), "converting");

        match format {
            Format::Office | Format::Html => {
                let office = self.office.as_ref().ok_or(Error::ConverterNotFound)?;
                office.convert_to_pdf(input, out_dir)
            }
            Format::Pdf => Err(Error::Conversion {
                path: input.to_path_buf(),
                reason: "PDF inputs need no conversion".to_string(),
            }),
            _ => {
                std::fs::create_dir_all(out_dir)?;
                let mut doc = native::convert(&self.fonts, input, format)?;
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "output".to_string());
                let produced = out_dir.join(format!("{stem}.pdf"));
                doc.save(&produced)?;
                Ok(produced)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("archive.zip");
        std::fs::write(&input, b"not a doc").unwrap();

        let converter = Converter::new(None);
        let err = converter.convert_to_pdf(&input, dir.path()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::new(None);
        let err = converter
            .convert_to_pdf(Path::new("/no/such/notes.txt"), dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
