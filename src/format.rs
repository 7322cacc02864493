//! Input format detection by file extension

use std::path::Path;

/// Supported input formats, grouped by the converter that handles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Office documents, rendered by headless LibreOffice
    Office,
    /// HTML, also rendered by LibreOffice
    Html,
    /// Plain text, rendered natively
    Text,
    /// Comma-separated values, rendered natively one record per line
    Csv,
    /// Markdown, rendered natively as styled text
    Markdown,
    /// XML, text content extracted and rendered natively
    Xml,
    /// Raster images, embedded one per page
    Image,
    /// Already a PDF; passed through (merge) or copied (individual)
    Pdf,
}

const OFFICE_EXTENSIONS: &[&str] = &[
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp",
];
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp",
];

impl Format {
    /// Detect the format of a file from its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::from_extension(&ext)
    }

    /// Detect a format from a bare extension (no leading dot).
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Format::Text),
            "csv" => Some(Format::Csv),
            "md" => Some(Format::Markdown),
            "xml" => Some(Format::Xml),
            "pdf" => Some(Format::Pdf),
            e if OFFICE_EXTENSIONS.contains(&e) => Some(Format::Office),
            e if HTML_EXTENSIONS.contains(&e) => Some(Format::Html),
            e if IMAGE_EXTENSIONS.contains(&e) => Some(Format::Image),
            _ => None,
        }
    }

    /// Extensions belonging to this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Office => OFFICE_EXTENSIONS,
            Format::Html => HTML_EXTENSIONS,
            Format::Text => &["txt"],
            Format::Csv => &["csv"],
            Format::Markdown => &["md"],
            Format::Xml => &["xml"],
            Format::Image => IMAGE_EXTENSIONS,
            Format::Pdf => &["pdf"],
        }
    }

    /// Whether this format is handled by the external office suite.
    pub fn needs_office(&self) -> bool {
        matches!(self, Format::Office | Format::Html)
    }

    /// Human-readable converter name for this format.
    pub fn converter_name(&self) -> &'static str {
        match self {
            Format::Office | Format::Html => "LibreOffice",
            Format::Pdf => "passthrough",
            _ => "native",
        }
    }
}

/// All supported extensions, in display order.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut all = Vec::new();
    for fmt in [
        Format::Office,
        Format::Html,
        Format::Text,
        Format::Csv,
        Format::Markdown,
        Format::Xml,
        Format::Image,
        Format::Pdf,
    ] {
        all.extend_from_slice(fmt.extensions());
    }
    all
}

/// Check whether a path has a supported extension.
pub fn is_supported(path: &Path) -> bool {
    Format::from_path(path).is_some()
}
