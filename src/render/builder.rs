//! Assembly of a fresh single PDF document from rendered pages

use lopdf::{Dictionary, Document, Object, Stream};

use super::page::PageDimensions;

/// Accumulates pages (content stream + resources) and finishes into a
/// well-formed document with a catalog and pages tree.
pub struct SinglePdfBuilder {
    doc: Document,
    dims: PageDimensions,
    pages: Vec<(lopdf::ObjectId, Dictionary)>,
}

impl SinglePdfBuilder {
    pub fn new(dims: PageDimensions) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            dims,
            pages: Vec::new(),
        }
    }

    /// Add an arbitrary object (font, XObject, ...) and get its id.
    pub fn add_object<O: Into<Object>>(&mut self, object: O) -> lopdf::ObjectId {
        self.doc.add_object(object)
    }

    /// Append a page with the given content stream and resources.
    pub fn add_page(&mut self, content: Vec<u8>, resources: Dictionary) {
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        self.pages.push((content_id, resources));
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Build the pages tree and catalog, compress, and return the document.
    pub fn finish(mut self) -> Document {
        let pages_id = self.doc.new_object_id();

        let media_box = Object::Array(vec![
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(self.dims.width.pt() as f32),
            Object::Real(self.dims.height.pt() as f32),
        ]);

        let mut kids: Vec<Object> = Vec::new();
        for (content_id, resources) in self.pages {
            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("MediaBox", media_box.clone());
            page.set("Contents", Object::Reference(content_id));
            page.set("Resources", Object::Dictionary(resources));
            let page_id = self.doc.add_object(Object::Dictionary(page));
            kids.push(Object::Reference(page_id));
        }

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(kids.len() as i64));
        pages_dict.set("Kids", Object::Array(kids));
        self.doc
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));

        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.compress();
        self.doc
    }
}
