//! Shaped text rendering into a PDF with an embedded Type0 font
//!
//! Lines are shaped with rustybuzz so complex scripts (Devanagari conjuncts,
//! matra reordering) come out correctly, then written as Identity-H glyph
//! runs. The embedded font carries a /ToUnicode CMap, and every drawn line is
//! additionally wrapped in an /ActualText span holding the exact source text,
//! so extraction round-trips the input even where a glyph id stands for more
//! than one code point.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use rustybuzz::ttf_parser::GlyphId;
use tracing::debug;

use super::builder::SinglePdfBuilder;
use super::font::LoadedFont;
use super::page::{ContentBox, Margins, PageDimensions};
use crate::error::{Error, Result};

/// Default body size in points
pub const BODY_SIZE: f32 = 11.0;
/// Line height as a multiple of the font size
const LEADING_FACTOR: f32 = 1.4;
/// Extra space after a paragraph block, as a multiple of the font size
const PARAGRAPH_GAP_FACTOR: f32 = 0.3;

/// One paragraph of source text with a point size.
#[derive(Debug, Clone)]
pub struct Block {
    pub text: String,
    pub size: f32,
}

impl Block {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: BODY_SIZE,
        }
    }

    pub fn sized(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            size,
        }
    }
}

/// Glyph ids used by the document, with the text they stand for.
#[derive(Default)]
struct GlyphMap {
    mapped: BTreeMap<u16, Vec<u16>>,
    unmapped: BTreeSet<u16>,
}

impl GlyphMap {
    /// Record a glyph. The first glyph of a cluster carries the cluster's
    /// text; continuation glyphs map to nothing unless a later occurrence
    /// gives them text of their own.
    fn record(&mut self, gid: u16, text: Option<&str>) {
        match text {
            Some(t) if !self.mapped.contains_key(&gid) => {
                self.mapped.insert(gid, t.encode_utf16().collect());
            }
            Some(_) => {}
            None => {
                self.unmapped.insert(gid);
            }
        }
    }

    /// All used glyph ids.
    fn glyph_ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.mapped
            .keys()
            .copied()
            .chain(self.unmapped.iter().copied())
            .collect::<BTreeSet<u16>>()
            .into_iter()
    }

    /// bfchar pairs for the ToUnicode CMap.
    fn to_unicode_entries(&self) -> Vec<(u16, Vec<u16>)> {
        self.glyph_ids()
            .map(|gid| (gid, self.mapped.get(&gid).cloned().unwrap_or_default()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct ShapedGlyph {
    gid: u16,
    /// Advance after shaping, in font units
    shaped_advance: i32,
    /// The face's unshaped horizontal advance, in font units
    font_advance: i32,
    /// Shaping displacement of the glyph itself (mark positioning), in font
    /// units; does not move the pen
    x_offset: i32,
    y_offset: i32,
}

struct ShapedLine {
    glyphs: Vec<ShapedGlyph>,
}

/// Shape one line and record its glyphs in the map.
fn shape_line(face: &rustybuzz::Face, text: &str, map: &mut GlyphMap) -> ShapedLine {
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    for (i, ch) in text.char_indices() {
        // Clusters carry byte offsets so shaped glyphs can be traced back to
        // the exact source slice
        buffer.add(ch, i as u32);
    }
    buffer.guess_segment_properties();

    let output = rustybuzz::shape(face, &[], buffer);
    let infos = output.glyph_infos();
    let positions = output.glyph_positions();

    // Cluster boundaries, for slicing source text per cluster
    let mut boundaries: Vec<u32> = infos.iter().map(|i| i.cluster).collect();
    boundaries.push(text.len() as u32);
    boundaries.sort_unstable();
    boundaries.dedup();
    let next_boundary = |cluster: u32| -> u32 {
        match boundaries.binary_search(&cluster) {
            Ok(i) if i + 1 < boundaries.len() => boundaries[i + 1],
            _ => text.len() as u32,
        }
    };

    let mut glyphs = Vec::with_capacity(infos.len());
    let mut prev_cluster: Option<u32> = None;

    for (info, pos) in infos.iter().zip(positions.iter()) {
        let gid = info.glyph_id as u16;
        let font_advance = face
            .glyph_hor_advance(GlyphId(gid))
            .map(i32::from)
            .unwrap_or(0);

        let is_cluster_start = prev_cluster != Some(info.cluster);
        if is_cluster_start {
            let start = info.cluster as usize;
            let end = next_boundary(info.cluster) as usize;
            map.record(gid, text.get(start..end));
        } else {
            map.record(gid, None);
        }
        prev_cluster = Some(info.cluster);

        glyphs.push(ShapedGlyph {
            gid,
            shaped_advance: pos.x_advance,
            font_advance,
            x_offset: pos.x_offset,
            y_offset: pos.y_offset,
        });
    }

    ShapedLine { glyphs }
}

/// Width of a line of text at the given size, in points.
fn measure(face: &rustybuzz::Face, text: &str, size: f32) -> f64 {
    let mut buffer = rustybuzz::UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    let output = rustybuzz::shape(face, &[], buffer);
    let units: i64 = output
        .glyph_positions()
        .iter()
        .map(|p| p.x_advance as i64)
        .sum();
    units as f64 * size as f64 / face.units_per_em() as f64
}

/// Greedy word wrap against the content width. Words wider than the whole
/// line are split by character.
fn wrap(face: &rustybuzz::Face, text: &str, size: f32, max_width: f64) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure(face, &candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if measure(face, word, size) <= max_width {
            current = word.to_string();
        } else {
            // Oversized word: hard-break by character
            let mut piece = String::new();
            for ch in word.chars() {
                piece.push(ch);
                if measure(face, &piece, size) > max_width && piece.chars().count() > 1 {
                    piece.pop();
                    lines.push(piece.clone());
                    piece.clear();
                    piece.push(ch);
                }
            }
            current = piece;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn hex_utf16(units: &[u16]) -> String {
    let mut s = String::with_capacity(units.len() * 4);
    for u in units {
        let _ = write!(s, "{u:04X}");
    }
    s
}

/// Emit the operators for one positioned line.
fn emit_line(
    ops: &mut String,
    shaped: &ShapedLine,
    source: &str,
    x: f64,
    y: f64,
    size: f32,
    upem: f64,
) {
    let actual: Vec<u16> = source.encode_utf16().collect();
    let _ = writeln!(ops, "BT");
    let _ = writeln!(ops, "/F1 {size:.2} Tf");
    let _ = writeln!(ops, "1 0 0 1 {x:.2} {y:.2} Tm");
    let _ = writeln!(
        ops,
        "/Span << /ActualText <FEFF{}> >> BDC",
        hex_utf16(&actual)
    );

    // TJ adjustments place each glyph at its shaped x position: a negative
    // pre-adjustment applies x_offset before the glyph, the post-adjustment
    // takes it back out along with any advance correction (kerning).
    // Vertical mark offsets become text rise, one TJ run per rise value.
    let to_units = 1000.0 / upem;
    let mut rise = 0i32;
    let mut open = false;
    for glyph in &shaped.glyphs {
        if !open || glyph.y_offset != rise {
            if open {
                let _ = writeln!(ops, ">] TJ");
            }
            if glyph.y_offset != rise {
                rise = glyph.y_offset;
                let _ = writeln!(ops, "{:.2} Ts", rise as f64 * size as f64 / upem);
            }
            let _ = write!(ops, "[<");
            open = true;
        }
        let pre = -(glyph.x_offset as f64) * to_units;
        if pre.abs() >= 1.0 {
            let _ = write!(ops, "> {pre:.0} <");
        }
        let _ = write!(ops, "{:04X}", glyph.gid);
        let post =
            (glyph.x_offset + glyph.font_advance - glyph.shaped_advance) as f64 * to_units;
        if post.abs() >= 1.0 {
            let _ = write!(ops, "> {post:.0} <");
        }
    }
    if open {
        let _ = writeln!(ops, ">] TJ");
    }
    if rise != 0 {
        // Text rise persists across BT/ET
        let _ = writeln!(ops, "0 Ts");
    }
    let _ = writeln!(ops, "EMC");
    let _ = writeln!(ops, "ET");
}

/// Render paragraphs onto A4 pages and return the finished document.
///
/// An empty block list (or blocks with no drawable text) still yields one
/// blank page.
pub fn render_text_document(font: &LoadedFont, blocks: &[Block]) -> Result<Document> {
    let face = font.face()?;
    let upem = face.units_per_em() as f64;
    let content_box = ContentBox::new(PageDimensions::a4(), Margins::one_inch());

    let mut map = GlyphMap::default();
    let mut page_ops: Vec<String> = Vec::new();
    let mut current_ops = String::new();
    let mut y = content_box.top_pt();
    let mut drew_anything = false;

    for block in blocks {
        let leading = (block.size * LEADING_FACTOR) as f64;
        let lines = wrap(&face, &block.text, block.size, content_box.width_pt());

        for line in lines {
            y -= leading;
            if y < content_box.bottom_pt() {
                page_ops.push(std::mem::take(&mut current_ops));
                y = content_box.top_pt() - leading;
            }
            if line.is_empty() {
                continue;
            }
            let shaped = shape_line(&face, &line, &mut map);
            emit_line(
                &mut current_ops,
                &shaped,
                &line,
                content_box.left_pt(),
                y,
                block.size,
                upem,
            );
            drew_anything = true;
        }
        y -= (block.size * PARAGRAPH_GAP_FACTOR) as f64;
    }

    if !current_ops.is_empty() || page_ops.is_empty() {
        page_ops.push(current_ops);
    }

    debug!(
        pages = page_ops.len(),
        glyphs = map.glyph_ids().count(),
        drew_anything,
        "laid out text document"
    );

    let mut builder = SinglePdfBuilder::new(PageDimensions::a4());
    let font_id = embed_type0_font(&mut builder, font, &map)?;

    for ops in page_ops {
        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(font_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        builder.add_page(ops.into_bytes(), resources);
    }

    Ok(builder.finish())
}

/// Embed the font as a Type0/Identity-H CID font with ToUnicode.
fn embed_type0_font(
    builder: &mut SinglePdfBuilder,
    font: &LoadedFont,
    map: &GlyphMap,
) -> Result<lopdf::ObjectId> {
    let face = font.face()?;
    let upem = face.units_per_em() as f64;
    if upem <= 0.0 {
        return Err(Error::Font(format!(
            "font has invalid units per em: {}",
            font.path.display()
        )));
    }
    let scale = 1000.0 / upem;
    let ps_name = font.postscript_name();

    // The font program itself
    let mut program_dict = Dictionary::new();
    program_dict.set("Length1", Object::Integer(font.data.len() as i64));
    let program_id = builder.add_object(Stream::new(program_dict, font.data.clone()));

    // Font descriptor
    let bbox = face.global_bounding_box();
    let mut descriptor = Dictionary::new();
    descriptor.set("Type", Object::Name(b"FontDescriptor".to_vec()));
    descriptor.set("FontName", Object::Name(ps_name.clone().into_bytes()));
    descriptor.set("Flags", Object::Integer(4)); // Symbolic
    descriptor.set(
        "FontBBox",
        Object::Array(vec![
            Object::Integer((bbox.x_min as f64 * scale) as i64),
            Object::Integer((bbox.y_min as f64 * scale) as i64),
            Object::Integer((bbox.x_max as f64 * scale) as i64),
            Object::Integer((bbox.y_max as f64 * scale) as i64),
        ]),
    );
    descriptor.set("ItalicAngle", Object::Integer(0));
    descriptor.set(
        "Ascent",
        Object::Integer((face.ascender() as f64 * scale) as i64),
    );
    descriptor.set(
        "Descent",
        Object::Integer((face.descender() as f64 * scale) as i64),
    );
    let cap_height = face
        .capital_height()
        .map(|h| h as f64 * scale)
        .unwrap_or(face.ascender() as f64 * scale);
    descriptor.set("CapHeight", Object::Integer(cap_height as i64));
    descriptor.set("StemV", Object::Integer(80));
    descriptor.set("FontFile2", Object::Reference(program_id));
    let descriptor_id = builder.add_object(Object::Dictionary(descriptor));

    // Per-glyph widths for the glyphs we actually used
    let mut widths: Vec<Object> = Vec::new();
    for gid in map.glyph_ids() {
        let advance = face
            .glyph_hor_advance(GlyphId(gid))
            .map(|a| a as f64 * scale)
            .unwrap_or(0.0);
        widths.push(Object::Integer(gid as i64));
        widths.push(Object::Array(vec![Object::Integer(advance as i64)]));
    }

    // CIDFontType2 descendant
    let mut system_info = Dictionary::new();
    system_info.set(
        "Registry",
        Object::String(b"Adobe".to_vec(), StringFormat::Literal),
    );
    system_info.set(
        "Ordering",
        Object::String(b"Identity".to_vec(), StringFormat::Literal),
    );
    system_info.set("Supplement", Object::Integer(0));

    let mut cid_font = Dictionary::new();
    cid_font.set("Type", Object::Name(b"Font".to_vec()));
    cid_font.set("Subtype", Object::Name(b"CIDFontType2".to_vec()));
    cid_font.set("BaseFont", Object::Name(ps_name.clone().into_bytes()));
    cid_font.set("CIDSystemInfo", Object::Dictionary(system_info));
    cid_font.set("FontDescriptor", Object::Reference(descriptor_id));
    cid_font.set("DW", Object::Integer(1000));
    cid_font.set("W", Object::Array(widths));
    cid_font.set("CIDToGIDMap", Object::Name(b"Identity".to_vec()));
    let cid_font_id = builder.add_object(Object::Dictionary(cid_font));

    let to_unicode_id = builder.add_object(Stream::new(
        Dictionary::new(),
        build_to_unicode_cmap(&map.to_unicode_entries()).into_bytes(),
    ));

    // The composite font pages reference as /F1
    let mut type0 = Dictionary::new();
    type0.set("Type", Object::Name(b"Font".to_vec()));
    type0.set("Subtype", Object::Name(b"Type0".to_vec()));
    type0.set("BaseFont", Object::Name(ps_name.into_bytes()));
    type0.set("Encoding", Object::Name(b"Identity-H".to_vec()));
    type0.set(
        "DescendantFonts",
        Object::Array(vec![Object::Reference(cid_font_id)]),
    );
    type0.set("ToUnicode", Object::Reference(to_unicode_id));

    Ok(builder.add_object(Object::Dictionary(type0)))
}

/// Build the ToUnicode CMap program mapping glyph ids to source text.
fn build_to_unicode_cmap(entries: &[(u16, Vec<u16>)]) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n\
         <0000> <FFFF>\n\
         endcodespacerange\n",
    );

    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (gid, units) in chunk {
            let _ = writeln!(cmap, "<{gid:04X}> <{}>", hex_utf16(units));
        }
        let _ = writeln!(cmap, "endbfchar");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmap_contains_header_and_entries() {
        let cmap = build_to_unicode_cmap(&[(3, vec![0x0041]), (7, vec![0x0915, 0x094D])]);
        assert!(cmap.contains("begincmap"));
        assert!(cmap.contains("<0003> <0041>"));
        assert!(cmap.contains("<0007> <0915094D>"));
        assert!(cmap.contains("endcmap"));
    }

    #[test]
    fn glyph_map_prefers_text_over_empty() {
        let mut map = GlyphMap::default();
        map.record(5, None);
        map.record(5, Some("क"));
        map.record(9, Some("a"));
        map.record(9, Some("b")); // first text wins

        let entries = map.to_unicode_entries();
        let five = entries.iter().find(|(g, _)| *g == 5).unwrap();
        assert_eq!(five.1, "क".encode_utf16().collect::<Vec<u16>>());
        let nine = entries.iter().find(|(g, _)| *g == 9).unwrap();
        assert_eq!(nine.1, vec![b'a' as u16]);
    }

    #[test]
    fn hex_utf16_formats_big_endian() {
        assert_eq!(hex_utf16(&[0x0041, 0x0915]), "00410915");
    }

    #[test]
    fn mark_offsets_become_rise_and_adjustments() {
        // A base glyph followed by a zero-advance mark the shaper raised by
        // 100 units and pulled back 250 units
        let shaped = ShapedLine {
            glyphs: vec![
                ShapedGlyph {
                    gid: 1,
                    shaped_advance: 1000,
                    font_advance: 1000,
                    x_offset: 0,
                    y_offset: 0,
                },
                ShapedGlyph {
                    gid: 2,
                    shaped_advance: 0,
                    font_advance: 500,
                    x_offset: -250,
                    y_offset: 100,
                },
            ],
        };
        let mut ops = String::new();
        emit_line(&mut ops, &shaped, "x", 72.0, 700.0, 10.0, 1000.0);

        // 100/1000 em at 10pt
        assert!(ops.contains("1.00 Ts"), "missing rise: {ops}");
        // x_offset applied before the mark and removed after, plus the
        // advance correction (-250 + 500 - 0)
        assert!(ops.contains("> 250 <0002"), "missing pre-adjustment: {ops}");
        assert!(ops.contains("0002> 250 <"), "missing post-adjustment: {ops}");
        // rise is reset before leaving the line
        assert!(ops.contains("\n0 Ts"), "missing rise reset: {ops}");
    }

    #[test]
    fn plain_glyphs_emit_a_single_tj_run() {
        let shaped = ShapedLine {
            glyphs: vec![
                ShapedGlyph {
                    gid: 0x41,
                    shaped_advance: 600,
                    font_advance: 600,
                    x_offset: 0,
                    y_offset: 0,
                },
                ShapedGlyph {
                    gid: 0x42,
                    shaped_advance: 550,
                    font_advance: 600,
                    x_offset: 0,
                    y_offset: 0,
                },
            ],
        };
        let mut ops = String::new();
        emit_line(&mut ops, &shaped, "AB", 72.0, 700.0, 12.0, 1000.0);

        assert_eq!(ops.matches("] TJ").count(), 1);
        assert!(!ops.contains("Ts"), "no rise expected: {ops}");
        // kern correction on the second glyph (600 - 550)
        assert!(ops.contains("0042> 50 <"), "missing kern adjustment: {ops}");
    }

    #[test]
    fn block_constructors_carry_sizes() {
        assert_eq!(Block::plain("x").size, BODY_SIZE);
        assert_eq!(Block::sized("x", 18.0).size, 18.0);
    }
}
