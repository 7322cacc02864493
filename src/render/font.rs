//! System font discovery for native text rendering
//!
//! Nothing is bundled with the binary; like the office-suite lookup, we
//! search the platform's usual install locations and pick a TrueType font
//! that actually covers the text being rendered. Devanagari text prefers the
//! common Devanagari families, everything else falls back to the stock Latin
//! faces shipped by the OS.

use std::fs;
use std::path::{Path, PathBuf};

use rustybuzz::ttf_parser;
use tracing::debug;

use crate::error::{Error, Result};

/// Unicode block for Devanagari plus its extended range.
fn is_devanagari(c: char) -> bool {
    matches!(c as u32, 0x0900..=0x097F | 0xA8E0..=0xA8FF)
}

/// Ranked filename fragments for Devanagari-capable fonts.
const DEVANAGARI_CANDIDATES: &[&str] = &[
    "notosansdevanagari-regular",
    "notoserifdevanagari-regular",
    "notosansdevanagari",
    "lohit-devanagari",
    "lohit_hi",
    "mangal",
    "gargi",
];

/// Ranked filename fragments for general Latin text.
const LATIN_CANDIDATES: &[&str] = &[
    "dejavusans",
    "liberationserif-regular",
    "liberationsans-regular",
    "notosans-regular",
    "freesans",
    "arial",
];

/// Directories searched for fonts, per platform.
fn font_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts/Supplemental"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(&home).join(".local/share/fonts"));
        }
    }

    dirs
}

/// A font file loaded into memory, ready for shaping and embedding.
#[derive(Debug)]
pub struct LoadedFont {
    pub path: PathBuf,
    pub data: Vec<u8>,
}

impl LoadedFont {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        // Reject files ttf-parser cannot open up front
        if rustybuzz::Face::from_slice(&data, 0).is_none() {
            return Err(Error::Font(format!(
                "not a usable TrueType font: {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Parse a shaping face over the loaded data.
    ///
    /// Faces borrow the data, so callers re-parse per use; parsing is cheap
    /// relative to shaping.
    pub fn face(&self) -> Result<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, 0).ok_or_else(|| {
            Error::Font(format!("failed to parse font: {}", self.path.display()))
        })
    }

    /// PostScript name from the name table, falling back to the file stem.
    pub fn postscript_name(&self) -> String {
        if let Ok(face) = self.face() {
            for name in face.names() {
                if name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME {
                    if let Some(s) = name.to_string() {
                        return sanitize_ps_name(&s);
                    }
                }
            }
        }
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "EmbeddedFont".to_string());
        sanitize_ps_name(&stem)
    }

    /// True if the face has a glyph for every non-control character sampled
    /// from `text`.
    pub fn covers(&self, text: &str) -> bool {
        let Ok(face) = self.face() else { return false };
        text.chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .take(512)
            .all(|c| face.glyph_index(c).is_some())
    }
}

/// PDF name objects cannot carry whitespace or delimiters.
fn sanitize_ps_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

/// Discovered font files plus an optional user-supplied override.
pub struct FontCatalog {
    override_path: Option<PathBuf>,
    files: Vec<PathBuf>,
}

impl FontCatalog {
    /// Scan the platform font directories. An explicit `--font-file` wins
    /// over everything discovered.
    pub fn discover(override_path: Option<PathBuf>) -> Self {
        let mut files = Vec::new();
        for dir in font_directories() {
            collect_ttf_files(&dir, 0, &mut files);
        }
        debug!(count = files.len(), "discovered font files");
        Self {
            override_path,
            files,
        }
    }

    /// Choose and load a font that covers `text`.
    pub fn font_for_text(&self, text: &str) -> Result<LoadedFont> {
        if let Some(path) = &self.override_path {
            if !path.exists() {
                return Err(Error::FileNotFound(path.clone()));
            }
            return LoadedFont::load(path);
        }

        let needs_devanagari = text.chars().any(is_devanagari);
        let ranked = if needs_devanagari {
            DEVANAGARI_CANDIDATES
        } else {
            LATIN_CANDIDATES
        };

        for fragment in ranked {
            if let Some(path) = self.find_candidate(fragment) {
                if let Ok(font) = LoadedFont::load(&path) {
                    if font.covers(text) {
                        debug!(path = %path.display(), "selected ranked font");
                        return Ok(font);
                    }
                }
            }
        }

        // No ranked candidate covers the text; fall back to scanning
        // everything we found.
        for path in &self.files {
            if let Ok(font) = LoadedFont::load(path) {
                if font.covers(text) {
                    debug!(path = %path.display(), "selected fallback font");
                    return Ok(font);
                }
            }
        }

        Err(Error::Font(if needs_devanagari {
            "no installed font covers Devanagari text; install Noto Sans Devanagari \
             or pass --font-file"
                .to_string()
        } else {
            "no usable TrueType font found on this system; pass --font-file".to_string()
        }))
    }

    /// First discovered file whose name contains the fragment, skipping
    /// bold/italic variants.
    fn find_candidate(&self, fragment: &str) -> Option<PathBuf> {
        self.files
            .iter()
            .find(|p| {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().to_ascii_lowercase())
                    .unwrap_or_default();
                name.contains(fragment)
                    && !name.contains("bold")
                    && !name.contains("italic")
                    && !name.contains("oblique")
            })
            .cloned()
    }

    /// Availability summary for the `check` command.
    pub fn summary(&self) -> Vec<(&'static str, Option<PathBuf>)> {
        vec![
            (
                "Devanagari font",
                DEVANAGARI_CANDIDATES
                    .iter()
                    .find_map(|f| self.find_candidate(f)),
            ),
            (
                "Latin font",
                LATIN_CANDIDATES.iter().find_map(|f| self.find_candidate(f)),
            ),
        ]
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

fn collect_ttf_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    // Font trees nest by foundry/family; four levels covers every platform
    if depth > 4 {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_ttf_files(&path, depth + 1, out);
        } else if path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("ttf"))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devanagari_detection() {
        assert!("नमस्ते".chars().any(is_devanagari));
        assert!(!"hello".chars().any(is_devanagari));
    }

    #[test]
    fn ps_name_sanitization() {
        assert_eq!(sanitize_ps_name("Noto Sans Devanagari"), "NotoSansDevanagari");
        assert_eq!(sanitize_ps_name("///"), "EmbeddedFont");
    }

    #[test]
    fn missing_override_is_reported() {
        let catalog = FontCatalog::discover(Some(PathBuf::from("/no/such/font.ttf")));
        let err = catalog.font_for_text("hello").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
