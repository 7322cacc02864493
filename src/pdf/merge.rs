//! Ordered PDF concatenation using lopdf
//!
//! Objects are renumbered and copied verbatim between documents, so embedded
//! resources (fonts in particular, including the Devanagari subsets
//! LibreOffice emits) are never re-encoded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Options for merging PDFs
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Input PDF paths, in the order their pages should appear
    pub inputs: Vec<PathBuf>,
    /// Output PDF path
    pub output: PathBuf,
}

/// Merge multiple PDF files into a single PDF, preserving input order.
///
/// Derived from the lopdf merge example: each document's objects are
/// renumbered past the running maximum id, pages are collected in input
/// order, and a fresh catalog/pages tree re-parents them.
pub fn merge_pdfs(options: &MergeOptions) -> Result<()> {
    if options.inputs.is_empty() {
        return Err(Error::NoInputs);
    }

    let documents = load_documents(&options.inputs)?;

    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let pages = doc.get_pages();
        page_ids.extend(pages.into_values());
        objects.extend(doc.objects);
    }

    debug!(objects = objects.len(), pages = page_ids.len(), "collected merged objects");

    let mut merged = Document::with_version("1.5");
    merged.objects.extend(objects);
    // new_object_id() must not collide with anything just copied in
    merged.max_id = max_id - 1;

    let pages_id = merged.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(page_ids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));

    let catalog_id = merged.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    merged.objects.insert(catalog_id, Object::Dictionary(catalog));
    merged.objects.insert(pages_id, Object::Dictionary(pages_dict));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    // Every page now hangs off the new tree
    for &page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = merged.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }

    merged.compress();
    merged.save(&options.output)?;

    info!(
        inputs = options.inputs.len(),
        pages = page_ids.len(),
        output = %options.output.display(),
        "merged"
    );
    Ok(())
}

/// Load and validate every input: must exist and contain at least one page.
fn load_documents(inputs: &[PathBuf]) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(inputs.len());
    for path in inputs {
        if !path.exists() {
            return Err(Error::FileNotFound(path.clone()));
        }
        let doc = Document::load(path)?;
        if doc.get_pages().is_empty() {
            return Err(Error::EmptyPdf(path.clone()));
        }
        documents.push(doc);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_list_is_rejected() {
        let options = MergeOptions {
            inputs: vec![],
            output: PathBuf::from("out.pdf"),
        };
        assert!(matches!(merge_pdfs(&options), Err(Error::NoInputs)));
    }

    #[test]
    fn missing_input_is_rejected() {
        let options = MergeOptions {
            inputs: vec![PathBuf::from("/no/such/a.pdf")],
            output: PathBuf::from("out.pdf"),
        };
        assert!(matches!(merge_pdfs(&options), Err(Error::FileNotFound(_))));
    }

    // Merges over real documents are covered in tests/integration.rs
}
