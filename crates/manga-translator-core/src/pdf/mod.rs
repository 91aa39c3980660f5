//! PDF rasterization via mupdf.

mod document;
mod render;

pub use document::PdfDocument;
pub use render::{PageRenderer, dpi_to_scale};
