//! Integration tests for the nimar-pdf library
//!
//! Tests that need a system font (native text rendering) or LibreOffice skip
//! themselves when the dependency is absent, the same way fixture-less
//! environments are handled elsewhere.

use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, Stream};
use tempfile::TempDir;

use nimar_pdf::error::Error;
use nimar_pdf::manifest::JobStatus;
use nimar_pdf::pdf::{count_pages, extract_text, merge_pdfs, page_texts, MergeOptions};
use nimar_pdf::pipeline::{run_batch, BatchOptions};
use nimar_pdf::render::{FontCatalog, LoadedFont};
use nimar_pdf::OverwritePolicy;

/// Build a one-page PDF with a Base-14 Helvetica line of ASCII text.
/// Needs no installed fonts, so merge/pipeline tests can run anywhere.
fn make_simple_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.5");

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    let font_id = doc.add_object(Object::Dictionary(font));

    let content = format!("BT\n/F1 24 Tf\n72 720 Td\n({text}) Tj\nET");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));
    let page_id = doc.add_object(Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(1));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).expect("failed to save test PDF");
}

/// A font covering `text`, or None (callers skip the test).
fn font_for(text: &str) -> Option<LoadedFont> {
    FontCatalog::discover(None).font_for_text(text).ok()
}

#[test]
fn merged_page_order_matches_input_order() {
    let dir = TempDir::new().unwrap();
    let names = ["alpha", "bravo", "charlie"];
    let mut inputs = Vec::new();
    for name in names {
        let path = dir.path().join(format!("{name}.pdf"));
        make_simple_pdf(&path, name);
        inputs.push(path);
    }

    let output = dir.path().join("combined.pdf");
    merge_pdfs(&MergeOptions {
        inputs: inputs.clone(),
        output: output.clone(),
    })
    .expect("merge failed");

    assert_eq!(count_pages(&output).unwrap(), 3);
    let texts = page_texts(&output).unwrap();
    assert_eq!(texts, vec!["alpha", "bravo", "charlie"]);

    // Reversed ordering reverses the pages
    let reversed = dir.path().join("reversed.pdf");
    inputs.reverse();
    merge_pdfs(&MergeOptions {
        inputs,
        output: reversed.clone(),
    })
    .unwrap();
    let texts = page_texts(&reversed).unwrap();
    assert_eq!(texts, vec!["charlie", "bravo", "alpha"]);
}

#[test]
fn individual_mode_copies_pdfs_with_suffix() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let a = dir.path().join("first.pdf");
    let b = dir.path().join("second.pdf");
    make_simple_pdf(&a, "first");
    make_simple_pdf(&b, "second");

    let report = run_batch(&BatchOptions::individual(vec![a, b], out.clone())).unwrap();

    assert_eq!(report.converted_count(), 2);
    assert!(!report.has_failures());
    assert_eq!(
        report.outputs,
        vec![
            out.join("first_converted.pdf"),
            out.join("second_converted.pdf")
        ]
    );
    for output in &report.outputs {
        assert_eq!(count_pages(output).unwrap(), 1);
    }
}

#[test]
fn rerun_surfaces_overwrite_instead_of_clobbering() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let input = dir.path().join("doc.pdf");
    make_simple_pdf(&input, "original");

    let options = BatchOptions::individual(vec![input.clone()], out.clone());
    let first = run_batch(&options).unwrap();
    assert_eq!(first.converted_count(), 1);

    // Second run must refuse, not silently replace
    let second = run_batch(&options).unwrap();
    assert_eq!(second.converted_count(), 0);
    let (_, reason) = second.failures().next().expect("expected a failure entry");
    assert!(reason.contains("exists"), "unexpected reason: {reason}");

    // Forcing replaces the file
    let mut forced = options.clone();
    forced.overwrite = OverwritePolicy::Overwrite;
    let third = run_batch(&forced).unwrap();
    assert_eq!(third.converted_count(), 1);
}

#[test]
fn merge_mode_refuses_existing_destination() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    make_simple_pdf(&a, "a");
    make_simple_pdf(&b, "b");

    let options = BatchOptions::merge(
        vec![a, b],
        dir.path().to_path_buf(),
        Some("bundle".to_string()),
    );
    run_batch(&options).unwrap();
    assert!(dir.path().join("bundle_merged.pdf").exists());

    let err = run_batch(&options).unwrap_err();
    assert!(matches!(err, Error::DestinationExists(_)));
}

#[test]
fn batch_continues_past_failed_inputs() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let good = dir.path().join("good.pdf");
    let unsupported = dir.path().join("data.zip");
    let missing = dir.path().join("gone.pdf");
    let also_good = dir.path().join("also.pdf");
    make_simple_pdf(&good, "good");
    std::fs::write(&unsupported, b"zip bytes").unwrap();
    make_simple_pdf(&also_good, "also");

    let report = run_batch(&BatchOptions::individual(
        vec![good, unsupported, missing, also_good],
        out.clone(),
    ))
    .unwrap();

    assert_eq!(report.entries.len(), 4);
    assert_eq!(report.converted_count(), 2);
    assert_eq!(report.failures().count(), 2);
    assert!(out.join("good_converted.pdf").exists());
    assert!(out.join("also_converted.pdf").exists());
}

#[test]
fn merge_skips_failures_and_keeps_order() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    let missing = dir.path().join("missing.pdf");
    make_simple_pdf(&a, "a");
    make_simple_pdf(&b, "b");

    let report = run_batch(&BatchOptions::merge(
        vec![a, missing, b],
        dir.path().to_path_buf(),
        Some("partial".to_string()),
    ))
    .unwrap();

    assert_eq!(report.converted_count(), 2);
    assert_eq!(report.failures().count(), 1);

    let output = dir.path().join("partial_merged.pdf");
    assert_eq!(count_pages(&output).unwrap(), 2);
    assert_eq!(page_texts(&output).unwrap(), vec!["a", "b"]);

    // Failure entry sits at its input position
    assert!(matches!(report.entries[1].status, JobStatus::Failed(_)));
}

#[test]
fn corrupt_pdf_is_skipped_not_fatal_in_merge() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    let corrupt = dir.path().join("broken.pdf");
    make_simple_pdf(&a, "a");
    make_simple_pdf(&b, "b");
    std::fs::write(&corrupt, b"not a pdf at all").unwrap();

    let report = run_batch(&BatchOptions::merge(
        vec![a, corrupt, b],
        dir.path().to_path_buf(),
        Some("salvaged".to_string()),
    ))
    .expect("a bad input must not abort the batch");

    assert_eq!(report.converted_count(), 2);
    assert!(matches!(report.entries[1].status, JobStatus::Failed(_)));

    let output = dir.path().join("salvaged_merged.pdf");
    assert_eq!(count_pages(&output).unwrap(), 2);
    assert_eq!(page_texts(&output).unwrap(), vec!["a", "b"]);
}

#[test]
fn zero_page_pdf_is_a_per_file_failure() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.pdf");
    make_simple_pdf(&good, "good");

    // Structurally valid PDF with an empty page tree
    let empty = dir.path().join("empty.pdf");
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Count", Object::Integer(0));
    pages.set("Kids", Object::Array(vec![]));
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.save(&empty).unwrap();

    let report = run_batch(&BatchOptions::merge(
        vec![good, empty],
        dir.path().to_path_buf(),
        Some("nonempty".to_string()),
    ))
    .unwrap();

    assert_eq!(report.converted_count(), 1);
    assert_eq!(report.failures().count(), 1);
    assert_eq!(
        count_pages(&dir.path().join("nonempty_merged.pdf")).unwrap(),
        1
    );
}

#[test]
fn text_file_converts_and_roundtrips() {
    let source = "Hello PDF\nSecond line";
    if font_for(source).is_none() {
        eprintln!("skipping: no usable system font");
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, source).unwrap();
    let out = dir.path().join("out");

    let report = run_batch(&BatchOptions::individual(vec![input], out.clone())).unwrap();
    assert_eq!(report.converted_count(), 1);

    let output = out.join("notes_converted.pdf");
    assert_eq!(count_pages(&output).unwrap(), 1);
    assert_eq!(extract_text(&output).unwrap(), source);
}

#[test]
fn devanagari_text_roundtrips_exactly() {
    let source = "नमस्ते दुनिया\nनिमाड़ पीडीएफ कंवर्टर";
    if font_for(source).is_none() {
        eprintln!("skipping: no installed Devanagari font");
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("hindi.txt");
    std::fs::write(&input, source).unwrap();
    let out = dir.path().join("out");

    let report = run_batch(&BatchOptions::individual(vec![input], out.clone())).unwrap();
    assert_eq!(report.converted_count(), 1);

    let output = out.join("hindi_converted.pdf");
    let extracted = extract_text(&output).unwrap();
    assert_eq!(extracted, source, "Devanagari text must round-trip byte-for-byte");
}

#[test]
fn devanagari_survives_merging() {
    let source = "क्षेत्रफल की गणना";
    if font_for(source).is_none() {
        eprintln!("skipping: no installed Devanagari font");
        return;
    }

    let dir = TempDir::new().unwrap();
    let hindi = dir.path().join("hindi.txt");
    std::fs::write(&hindi, source).unwrap();
    let ascii = dir.path().join("ascii.pdf");
    make_simple_pdf(&ascii, "plain");

    let report = run_batch(&BatchOptions::merge(
        vec![hindi, ascii],
        dir.path().to_path_buf(),
        None,
    ))
    .unwrap();
    assert_eq!(report.converted_count(), 2);

    let output = dir.path().join("converted_files_merged.pdf");
    assert_eq!(count_pages(&output).unwrap(), 2);
    let texts = page_texts(&output).unwrap();
    assert_eq!(texts[0], source);
    assert_eq!(texts[1], "plain");
}

#[test]
fn csv_renders_with_pipe_separators() {
    let source = "name,city\nRavi,Indore";
    if font_for(source).is_none() {
        eprintln!("skipping: no usable system font");
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("table.csv");
    std::fs::write(&input, source).unwrap();
    let out = dir.path().join("out");

    run_batch(&BatchOptions::individual(vec![input], out.clone())).unwrap();

    let text = extract_text(&out.join("table_converted.pdf")).unwrap();
    assert_eq!(text, "name | city\nRavi | Indore");
}

#[test]
fn empty_text_file_yields_one_blank_page() {
    if font_for("x").is_none() {
        eprintln!("skipping: no usable system font");
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.txt");
    std::fs::write(&input, "").unwrap();
    let out = dir.path().join("out");

    run_batch(&BatchOptions::individual(vec![input], out.clone())).unwrap();
    assert_eq!(count_pages(&out.join("empty_converted.pdf")).unwrap(), 1);
}

#[test]
fn image_converts_to_single_page_pdf() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("photo.png");

    // Small gradient so the JPEG encoder has real data
    let img = image::RgbImage::from_fn(64, 48, |x, y| {
        image::Rgb([(x * 4) as u8, (y * 5) as u8, 128])
    });
    img.save(&input).unwrap();

    let out = dir.path().join("out");
    let report = run_batch(&BatchOptions::individual(vec![input], out.clone())).unwrap();
    assert_eq!(report.converted_count(), 1);

    let output = out.join("photo_converted.pdf");
    assert_eq!(count_pages(&output).unwrap(), 1);
}

#[test]
fn office_document_converts_when_libreoffice_present() {
    let dir = TempDir::new().unwrap();
    let converter = nimar_pdf::convert::Converter::new(None);
    if converter.office().is_none() {
        eprintln!("skipping: LibreOffice not installed");
        return;
    }

    // LibreOffice accepts plain text as a Writer document; use .odt-adjacent
    // txt routed through the office path by calling the converter directly
    let input = dir.path().join("memo.txt");
    std::fs::write(&input, "office conversion smoke test").unwrap();
    let produced = converter
        .office()
        .unwrap()
        .convert_to_pdf(&input, dir.path())
        .expect("LibreOffice conversion failed");
    assert!(count_pages(&produced).unwrap() >= 1);
}

#[test]
fn merged_output_name_strips_pdf_suffix() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.pdf");
    let b = dir.path().join("b.pdf");
    make_simple_pdf(&a, "a");
    make_simple_pdf(&b, "b");

    run_batch(&BatchOptions::merge(
        vec![a, b],
        dir.path().to_path_buf(),
        Some("set.pdf".to_string()),
    ))
    .unwrap();

    assert!(dir.path().join("set_merged.pdf").exists());
}

#[test]
fn glob_free_paths_are_left_untouched() {
    // Ordering contract: literal inputs never get re-sorted by the pipeline
    let dir = TempDir::new().unwrap();
    let z = dir.path().join("z.pdf");
    let a = dir.path().join("a.pdf");
    make_simple_pdf(&z, "zed");
    make_simple_pdf(&a, "ay");

    let report = run_batch(&BatchOptions::merge(
        vec![z, a],
        dir.path().to_path_buf(),
        Some("order".to_string()),
    ))
    .unwrap();
    assert_eq!(report.converted_count(), 2);

    let texts = page_texts(&dir.path().join("order_merged.pdf")).unwrap();
    assert_eq!(texts, vec!["zed", "ay"]);
}

/// Exercised here rather than in unit tests because it touches the real
/// filesystem layout of PathBuf on the host platform.
#[test]
fn output_paths_use_source_stems() {
    let out = PathBuf::from("/outdir");
    assert_eq!(
        nimar_pdf::manifest::individual_output_path(&out, Path::new("/x/슬라이드.pptx")),
        out.join("슬라이드_converted.pdf")
    );
}
