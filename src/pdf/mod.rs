//! PDF manipulation module

pub mod extract;
pub mod merge;
pub mod metadata;

// Re-export commonly used items
pub use extract::{extract_text, page_texts};
pub use merge::{merge_pdfs, MergeOptions};
pub use metadata::{count_pages, extract_metadata, PdfMetadata};
