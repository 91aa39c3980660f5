//! Decoded pages and the ordered page sequence of one upload.

use image::{DynamicImage, ImageEncoder};
use webp::Encoder as WebpEncoder;

use crate::error::{Error, Result};
use crate::upload::DocumentKind;

/// A decoded raster page with its position in the source document.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 0-based position in the page sequence
    pub index: usize,
    pub image: DynamicImage,
}

impl PageImage {
    pub const fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode the page as PNG bytes
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let rgba = self.image.to_rgba8();

        let mut png_data = Vec::new();
        // Use fast compression for better performance (still lossless)
        let encoder = image::codecs::png::PngEncoder::new_with_quality(
            &mut png_data,
            image::codecs::png::CompressionType::Fast,
            image::codecs::png::FilterType::Adaptive,
        );

        encoder
            .write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| Error::Decode {
                name: format!("page {}", self.index + 1),
                reason: format!("Failed to encode PNG: {e}"),
            })?;

        Ok(png_data)
    }

    /// Encode the page as lossy WebP (quality 85)
    pub fn encode_webp(&self) -> Vec<u8> {
        let rgba = self.image.to_rgba8();
        let encoder = WebpEncoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
        encoder.encode(85.0).to_vec()
    }
}

/// Ordered, non-empty list of pages derived from one upload.
#[derive(Debug, Clone)]
pub struct PageSequence {
    pages: Vec<PageImage>,
    kind: DocumentKind,
    /// MD5 hex of the uploaded bytes
    content_id: String,
}

impl PageSequence {
    /// Build a sequence from decoded images in reading order.
    ///
    /// Fails with `EmptyDocument` when `images` is empty.
    pub fn new(
        images: Vec<DynamicImage>,
        kind: DocumentKind,
        content_id: impl Into<String>,
    ) -> Result<Self> {
        if images.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let pages = images
            .into_iter()
            .enumerate()
            .map(|(index, image)| PageImage::new(index, image))
            .collect();

        Ok(Self {
            pages,
            kind,
            content_id: content_id.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Always false for a constructed sequence; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Bounds-checked page access (0-based).
    pub fn get(&self, index: usize) -> Result<&PageImage> {
        self.pages.get(index).ok_or(Error::InvalidPage {
            page: index,
            total: self.pages.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageImage> {
        self.pages.iter()
    }
}
