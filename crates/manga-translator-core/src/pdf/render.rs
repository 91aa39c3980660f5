use image::{DynamicImage, RgbImage};
use mupdf::{Colorspace, Matrix};
use tracing::debug;

use super::document::PdfDocument;
use crate::error::{Error, Result};

/// PDF user space is 72 units per inch
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Scale factor that rasterizes a PDF page at `dpi`.
#[allow(clippy::cast_precision_loss)] // DPI values are small
pub fn dpi_to_scale(dpi: u32) -> f32 {
    dpi as f32 / PDF_POINTS_PER_INCH
}

/// mupdf addresses pages with `i32`.
fn page_number(page: usize, total: usize) -> Result<i32> {
    let invalid = || Error::InvalidPage { page, total };
    if page >= total {
        return Err(invalid());
    }
    i32::try_from(page).map_err(|_| invalid())
}

/// Repack interleaved gray / gray+alpha / RGB / RGBA samples as RGB.
fn samples_to_rgb(samples: &[u8], width: u32, height: u32, components: usize) -> Option<RgbImage> {
    let rgb: Vec<u8> = match components {
        1 | 2 => samples
            .chunks_exact(components)
            .flat_map(|px| [px[0], px[0], px[0]])
            .collect(),
        3 | 4 => samples
            .chunks_exact(components)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        _ => return None,
    };
    RgbImage::from_raw(width, height, rgb)
}

/// Rasterizes pages of one document at a fixed scale
pub struct PageRenderer<'a> {
    doc: &'a PdfDocument,
    scale: f32,
}

impl<'a> PageRenderer<'a> {
    pub const fn with_scale(doc: &'a PdfDocument, scale: f32) -> Self {
        Self { doc, scale }
    }

    pub fn with_dpi(doc: &'a PdfDocument, dpi: u32) -> Self {
        Self::with_scale(doc, dpi_to_scale(dpi))
    }

    /// Render one 0-based page to RGB (alpha is dropped).
    pub fn render_page(&self, page: usize) -> Result<RgbImage> {
        let index = page_number(page, self.doc.page_count())?;
        let render_error = |reason: String| Error::PdfRender { page, reason };

        let loaded = self
            .doc
            .inner()
            .load_page(index)
            .map_err(|e| render_error(format!("load: {e}")))?;

        let pixmap = loaded
            .to_pixmap(
                &Matrix::new_scale(self.scale, self.scale),
                &Colorspace::device_rgb(),
                1.0,
                true,
            )
            .map_err(|e| render_error(format!("rasterize: {e}")))?;

        #[allow(clippy::cast_sign_loss)]
        let components = pixmap.n() as usize;
        samples_to_rgb(pixmap.samples(), pixmap.width(), pixmap.height(), components)
            .ok_or_else(|| render_error(format!("unexpected pixmap layout ({components} components)")))
    }

    /// Render every page in document order.
    ///
    /// Stops at the first failing page; no partial result is returned.
    pub fn render_all(&self) -> Result<Vec<DynamicImage>> {
        let total = self.doc.page_count();

        (0..total)
            .map(|page| {
                let image = self.render_page(page)?;
                debug!(
                    "Rendered PDF page {}/{} at {}x{}",
                    page + 1,
                    total,
                    image.width(),
                    image.height()
                );
                Ok(DynamicImage::ImageRgb8(image))
            })
            .collect()
    }
}
