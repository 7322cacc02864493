//! Text extraction for PDFs produced by this tool
//!
//! Three sources of text, in order of fidelity: /ActualText marked-content
//! spans (exact source text, what our own renderer writes), /ToUnicode CMap
//! lookup for Identity-H glyph runs, and Latin-1 literal strings for simple
//! fonts. Arbitrary third-party PDFs may extract only partially; that is
//! enough for `info --text` and the round-trip tests.

use std::collections::HashMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};

use crate::error::{Error, Result};

/// Extract the text of every page, in page order.
pub fn page_texts(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let mut doc = Document::load(path)?;
    doc.decompress();

    let mut pages = Vec::new();
    for (_number, page_id) in doc.get_pages() {
        pages.push(extract_page(&doc, page_id)?);
    }
    Ok(pages)
}

/// Extract the whole document as one string, pages joined with newlines.
pub fn extract_text(path: &Path) -> Result<String> {
    let pages = page_texts(path)?;
    Ok(pages.join("\n").trim_end().to_string())
}

fn extract_page(doc: &Document, page_id: lopdf::ObjectId) -> Result<String> {
    let fonts = page_font_maps(doc, page_id);
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;

    let mut text = String::new();
    let mut current_font: Option<String> = None;
    // Stack of open marked-content sections; true = ActualText already taken
    let mut spans: Vec<bool> = Vec::new();

    for op in &content.operations {
        match op.operator.as_str() {
            "BDC" => {
                let actual = actual_text(&op.operands);
                if let Some(s) = &actual {
                    text.push_str(s);
                    text.push('\n');
                }
                spans.push(actual.is_some());
            }
            "EMC" => {
                spans.pop();
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    current_font = Some(String::from_utf8_lossy(name).into_owned());
                }
            }
            "Tj" | "'" | "\"" => {
                if spans.iter().any(|taken| *taken) {
                    continue;
                }
                if let Some(Object::String(bytes, _)) = op.operands.last() {
                    push_decoded(&mut text, bytes, current_font.as_deref(), &fonts);
                    text.push('\n');
                }
            }
            "TJ" => {
                if spans.iter().any(|taken| *taken) {
                    continue;
                }
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        if let Object::String(bytes, _) = item {
                            push_decoded(&mut text, bytes, current_font.as_deref(), &fonts);
                        }
                    }
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

/// /ActualText value of a /Span BDC, decoded.
fn actual_text(operands: &[Object]) -> Option<String> {
    match operands {
        [Object::Name(tag), Object::Dictionary(props)] if tag == b"Span" => {
            match props.get(b"ActualText").ok()? {
                Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// UTF-16BE when BOM-prefixed, Latin-1 otherwise (PDF text string rules).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

fn push_decoded(
    out: &mut String,
    bytes: &[u8],
    font: Option<&str>,
    fonts: &HashMap<String, FontText>,
) {
    match font.and_then(|f| fonts.get(f)) {
        Some(FontText::ToUnicode(map)) => {
            let mut units = Vec::new();
            for pair in bytes.chunks_exact(2) {
                let gid = u16::from_be_bytes([pair[0], pair[1]]);
                if let Some(mapped) = map.get(&gid) {
                    units.extend_from_slice(mapped);
                }
            }
            out.push_str(&String::from_utf16_lossy(&units));
        }
        _ => {
            // Simple font; assume a Latin-1-compatible encoding
            out.extend(bytes.iter().map(|&b| b as char));
        }
    }
}

/// How a page font's strings decode.
enum FontText {
    ToUnicode(HashMap<u16, Vec<u16>>),
    Simple,
}

/// Build the glyph-to-text maps for every font on the page.
fn page_font_maps(doc: &Document, page_id: lopdf::ObjectId) -> HashMap<String, FontText> {
    let mut maps = HashMap::new();
    let Some(fonts) = page_fonts_dict(doc, page_id) else {
        return maps;
    };

    for (name, value) in fonts.iter() {
        let font_name = String::from_utf8_lossy(name).into_owned();
        let Some(Object::Dictionary(font)) = resolve(doc, value) else {
            continue;
        };
        let entry = match font.get(b"ToUnicode").ok().and_then(|o| resolve(doc, o)) {
            Some(Object::Stream(stream)) => {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                FontText::ToUnicode(parse_bfchar_cmap(&data))
            }
            _ => FontText::Simple,
        };
        maps.insert(font_name, entry);
    }
    maps
}

/// Page → Resources → Font, following references.
fn page_fonts_dict<'a>(doc: &'a Document, page_id: lopdf::ObjectId) -> Option<&'a Dictionary> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = resolve(doc, page.get(b"Resources").ok()?)?.as_dict().ok()?;
    resolve(doc, resources.get(b"Font").ok()?)?.as_dict().ok()
}

/// Follow a reference to its object (one level is enough for our output).
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Parse the bfchar sections of a ToUnicode CMap.
fn parse_bfchar_cmap(data: &[u8]) -> HashMap<u16, Vec<u16>> {
    let text = String::from_utf8_lossy(data);
    let mut map = HashMap::new();
    let mut in_bfchar = false;

    for line in text.lines() {
        let line = line.trim();
        if line.ends_with("beginbfchar") {
            in_bfchar = true;
            continue;
        }
        if line == "endbfchar" {
            in_bfchar = false;
            continue;
        }
        if !in_bfchar {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(src), Some(dst)) = (parts.next(), parts.next()) else {
            continue;
        };
        let (Some(gid), Some(units)) = (parse_hex_u16(src), parse_hex_units(dst)) else {
            continue;
        };
        map.insert(gid, units);
    }
    map
}

fn parse_hex_u16(token: &str) -> Option<u16> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    u16::from_str_radix(inner, 16).ok()
}

fn parse_hex_units(token: &str) -> Option<Vec<u16>> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    if inner.len() % 4 != 0 {
        return None;
    }
    inner
        .as_bytes()
        .chunks(4)
        .map(|c| u16::from_str_radix(std::str::from_utf8(c).ok()?, 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_string_decoding() {
        assert_eq!(decode_pdf_string(b"hello"), "hello");
        // UTF-16BE with BOM: "नम"
        let bytes = [0xFE, 0xFF, 0x09, 0x28, 0x09, 0x2E];
        assert_eq!(decode_pdf_string(&bytes), "नम");
    }

    #[test]
    fn bfchar_cmap_parsing() {
        let cmap = b"2 beginbfchar\n<0003> <0041>\n<0007> <0915094D>\nendbfchar\n";
        let map = parse_bfchar_cmap(cmap);
        assert_eq!(map.get(&3), Some(&vec![0x0041]));
        assert_eq!(map.get(&7), Some(&vec![0x0915, 0x094D]));
    }

    #[test]
    fn empty_target_maps_to_nothing() {
        let cmap = b"1 beginbfchar\n<0009> <>\nendbfchar\n";
        let map = parse_bfchar_cmap(cmap);
        assert_eq!(map.get(&9), Some(&Vec::new()));
    }

    #[test]
    fn hex_token_parsing() {
        assert_eq!(parse_hex_u16("<00FF>"), Some(255));
        assert_eq!(parse_hex_u16("00FF"), None);
        assert_eq!(parse_hex_units("<0041094D>"), Some(vec![0x41, 0x94D]));
        assert_eq!(parse_hex_units("<041>"), None);
    }
}
