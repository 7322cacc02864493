//! Image-to-PDF rendering
//!
//! Each image becomes one page: decoded with the `image` crate, flattened to
//! RGB, re-encoded as JPEG and embedded as a DCTDecode XObject, scaled to fit
//! the content box while preserving aspect ratio, centered.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use lopdf::{Dictionary, Document, Object, Stream};
use tracing::debug;

use super::builder::SinglePdfBuilder;
use super::page::{ContentBox, Margins, PageDimensions};
use crate::error::Result;

/// JPEG quality for re-encoded images
const JPEG_QUALITY: u8 = 90;

/// Render a single image file to a one-page PDF document.
pub fn render_image_document(input: &Path) -> Result<Document> {
    let decoded = image::open(input)?;
    // Flatten alpha onto white rather than letting JPEG guess
    let rgb = decoded.to_rgb8();
    let (width_px, height_px) = rgb.dimensions();

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), JPEG_QUALITY);
    encoder.encode(
        rgb.as_raw(),
        width_px,
        height_px,
        image::ExtendedColorType::Rgb8,
    )?;

    debug!(
        input = %input.display(),
        width_px,
        height_px,
        jpeg_bytes = jpeg.len(),
        "encoded image"
    );

    let content_box = ContentBox::new(PageDimensions::a4(), Margins::uniform(
        super::page::Length::from_pt(50.0),
    ));
    let (draw_w, draw_h, x, y) = fit_centered(
        width_px as f64,
        height_px as f64,
        &content_box,
    );

    let mut builder = SinglePdfBuilder::new(PageDimensions::a4());

    let mut image_dict = Dictionary::new();
    image_dict.set("Type", Object::Name(b"XObject".to_vec()));
    image_dict.set("Subtype", Object::Name(b"Image".to_vec()));
    image_dict.set("Width", Object::Integer(width_px as i64));
    image_dict.set("Height", Object::Integer(height_px as i64));
    image_dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    image_dict.set("BitsPerComponent", Object::Integer(8));
    image_dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    let mut image_stream = Stream::new(image_dict, jpeg);
    // Already compressed; a second Flate pass only wastes space
    image_stream.allows_compression = false;
    let image_id = builder.add_object(image_stream);

    let content = format!("q\n{draw_w:.2} 0 0 {draw_h:.2} {x:.2} {y:.2} cm\n/Im0 Do\nQ\n");

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(image_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    builder.add_page(content.into_bytes(), resources);
    Ok(builder.finish())
}

/// Scale (preserving aspect) to fit the content box and center on the page.
/// Returns (width, height, x, y) in points.
fn fit_centered(img_w: f64, img_h: f64, content: &ContentBox) -> (f64, f64, f64, f64) {
    let max_w = content.width_pt();
    let max_h = content.height_pt();
    let scale = (max_w / img_w).min(max_h / img_h);

    let draw_w = img_w * scale;
    let draw_h = img_h * scale;
    let page_w = content.page.width.pt();
    let page_h = content.page.height.pt();
    let x = (page_w - draw_w) / 2.0;
    let y = (page_h - draw_h) / 2.0;
    (draw_w, draw_h, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_box() -> ContentBox {
        ContentBox::new(
            PageDimensions::a4(),
            Margins::uniform(super::super::page::Length::from_pt(50.0)),
        )
    }

    #[test]
    fn wide_image_is_width_limited_and_centered() {
        let content = content_box();
        let (w, h, x, y) = fit_centered(2000.0, 1000.0, &content);
        assert!((w - content.width_pt()).abs() < 0.01);
        assert!((w / h - 2.0).abs() < 0.001);
        assert!((x - (content.page.width.pt() - w) / 2.0).abs() < 0.01);
        assert!(y > 0.0);
    }

    #[test]
    fn tall_image_is_height_limited() {
        let content = content_box();
        let (w, h, _, _) = fit_centered(500.0, 4000.0, &content);
        assert!((h - content.height_pt()).abs() < 0.01);
        assert!(w < h);
    }
}
