//! Native PDF rendering for text-like formats and images

pub mod builder;
pub mod font;
pub mod image;
pub mod page;
pub mod text;

pub use font::{FontCatalog, LoadedFont};
pub use text::{render_text_document, Block};
