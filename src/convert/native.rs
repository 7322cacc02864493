//! Native converters for text-like formats and images
//!
//! These mirror what the office suite is not needed for: plain text, CSV,
//! Markdown and XML become shaped text pages; images are embedded one per
//! page. Each converter reads the source, lowers it to paragraph blocks, and
//! hands off to the text renderer.

use std::fs;
use std::path::Path;

use lopdf::Document;
use tracing::debug;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::render::image::render_image_document;
use crate::render::text::{Block, BODY_SIZE};
use crate::render::{render_text_document, FontCatalog};

/// Heading sizes for Markdown `#` through `######`
const HEADING_SIZES: [f32; 6] = [20.0, 17.0, 15.0, 13.0, 12.0, 11.5];

/// Convert a natively supported file into an in-memory PDF document.
pub fn convert(catalog: &FontCatalog, input: &Path, format: Format) -> Result<Document> {
    if !input.exists() {
        return Err(Error::FileNotFound(input.to_path_buf()));
    }

    debug!(input = %input.display(), ?format, "native conversion");

    match format {
        Format::Image => render_image_document(input),
        Format::Text | Format::Csv | Format::Markdown | Format::Xml => {
            let raw = fs::read_to_string(input).map_err(|e| Error::Conversion {
                path: input.to_path_buf(),
                reason: format!("not valid UTF-8 text: {e}"),
            })?;
            let blocks = match format {
                Format::Text => text_blocks(&raw),
                Format::Csv => csv_blocks(&raw),
                Format::Markdown => markdown_blocks(&raw),
                Format::Xml => text_blocks(&xml_text_content(&raw)),
                _ => unreachable!(),
            };
            let sample: String = blocks.iter().map(|b| b.text.as_str()).collect();
            let font = catalog.font_for_text(&sample)?;
            render_text_document(&font, &blocks)
        }
        other => Err(Error::Conversion {
            path: input.to_path_buf(),
            reason: format!("{other:?} is not a native format"),
        }),
    }
}

/// Plain text: one block per source line, empty lines preserved.
fn text_blocks(raw: &str) -> Vec<Block> {
    raw.lines().map(Block::plain).collect()
}

/// CSV: one line per record, cells joined with " | ".
fn csv_blocks(raw: &str) -> Vec<Block> {
    raw.lines()
        .map(|line| {
            let joined = split_csv_record(line).join(" | ");
            Block::plain(joined)
        })
        .collect()
}

/// Minimal CSV field splitting with double-quote handling.
fn split_csv_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

/// Markdown rendered as styled text: headings get larger sizes, code-fence
/// delimiters are dropped, everything else is carried verbatim.
fn markdown_blocks(raw: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }
        let hashes = trimmed.chars().take_while(|c| *c == '#').count();
        if (1..=6).contains(&hashes)
            && trimmed.chars().nth(hashes).map(|c| c == ' ').unwrap_or(false)
        {
            let text = trimmed[hashes + 1..].trim().to_string();
            blocks.push(Block::sized(text, HEADING_SIZES[hashes - 1]));
        } else {
            blocks.push(Block::sized(line.to_string(), BODY_SIZE));
        }
    }
    blocks
}

/// Strip tags from XML and keep the text content, one block per line.
fn xml_text_content(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    // Collapse the whitespace runs the markup leaves behind
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_blocks_preserve_empty_lines() {
        let blocks = text_blocks("first\n\nsecond");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].text, "first");
        assert_eq!(blocks[1].text, "");
        assert_eq!(blocks[2].text, "second");
    }

    #[test]
    fn csv_records_join_with_pipes() {
        let blocks = csv_blocks("name,city\n\"Last, First\",Indore");
        assert_eq!(blocks[0].text, "name | city");
        assert_eq!(blocks[1].text, "Last, First | Indore");
    }

    #[test]
    fn csv_quotes_escape() {
        let fields = split_csv_record("a,\"he said \"\"hi\"\"\",b");
        assert_eq!(fields, vec!["a", "he said \"hi\"", "b"]);
    }

    #[test]
    fn markdown_headings_get_sizes() {
        let blocks = markdown_blocks("# Title\ntext\n## Sub\n```\ncode\n```");
        assert_eq!(blocks[0].text, "Title");
        assert_eq!(blocks[0].size, HEADING_SIZES[0]);
        assert_eq!(blocks[1].size, BODY_SIZE);
        assert_eq!(blocks[2].size, HEADING_SIZES[1]);
        // fence delimiters dropped, content kept
        assert_eq!(blocks[3].text, "code");
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        let blocks = markdown_blocks("#tag");
        assert_eq!(blocks[0].size, BODY_SIZE);
        assert_eq!(blocks[0].text, "#tag");
    }

    #[test]
    fn xml_tags_are_stripped() {
        let text = xml_text_content("<doc><title>नमस्ते</title>\n<p>hello</p></doc>");
        assert_eq!(text, "नमस्ते\nhello");
    }
}
