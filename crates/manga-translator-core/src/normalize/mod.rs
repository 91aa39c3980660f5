//! Turn an uploaded file into an ordered sequence of page images.
//!
//! Dispatch is on the declared file extension:
//!
//! | extension         | policy                                       |
//! |-------------------|----------------------------------------------|
//! | png / jpg / jpeg  | decoded as a single page                     |
//! | pdf               | every page rasterized at `pdf_dpi`           |
//! | cbz               | image entries decoded in sorted name order   |
//! | anything else     | `Error::UnsupportedFormat`                   |
//!
//! The call either yields the complete page sequence or an error; pages
//! decoded before a failure are discarded.

pub mod archive;
pub mod raster;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info};

use crate::config::NormalizeConfig;
use crate::error::{Error, Result};
use crate::page::PageSequence;
use crate::pdf::{PageRenderer, PdfDocument};
use crate::scratch::ScratchDir;
use crate::upload::{DocumentKind, UploadedFile};

/// Converts uploads into page sequences, staging them in the scratch dir.
#[derive(Debug, Clone)]
pub struct Normalizer {
    scratch: Arc<ScratchDir>,
    config: NormalizeConfig,
}

impl Normalizer {
    pub const fn new(scratch: Arc<ScratchDir>, config: NormalizeConfig) -> Self {
        Self { scratch, config }
    }

    /// Normalize one upload into its pages.
    ///
    /// Blocking: decoding and PDF rendering are CPU bound. Call through
    /// `spawn_blocking` from async code.
    pub fn normalize(&self, file: &UploadedFile) -> Result<PageSequence> {
        let kind = DocumentKind::from_file_name(&file.name)?;

        let path = self.scratch.persist(file)?;
        debug!("Normalizing {} as {}", file.name, kind.label());

        let images = match kind {
            DocumentKind::Raster => vec![raster::decode_file(&path, &file.name)?],
            DocumentKind::Pdf => self.render_pdf(&path)?,
            DocumentKind::ComicArchive => decode_archive(&path)?,
        };

        let pages = PageSequence::new(images, kind, file.content_id())?;
        info!("Normalized {} into {} page(s)", file.name, pages.len());
        Ok(pages)
    }

    fn render_pdf(&self, path: &Path) -> Result<Vec<DynamicImage>> {
        let doc = PdfDocument::open(path)?;
        PageRenderer::with_dpi(&doc, self.config.pdf_dpi).render_all()
    }
}

fn decode_archive(path: &Path) -> Result<Vec<DynamicImage>> {
    let file = File::open(path).map_err(|e| Error::Archive(e.to_string()))?;
    archive::decode_pages(BufReader::new(file))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(Arc::new(ScratchDir::new().unwrap()), NormalizeConfig::default())
    }

    #[test]
    fn test_unsupported_extension() {
        let file = UploadedFile::new("notes.txt", b"hello".to_vec());
        let result = normalizer().normalize(&file);
        assert!(matches!(result, Err(Error::UnsupportedFormat { ref extension }) if extension == "txt"));
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let file = UploadedFile::new("page.png", b"not an image".to_vec());
        let result = normalizer().normalize(&file);
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_corrupt_pdf_is_open_error() {
        let file = UploadedFile::new("chapter.pdf", vec![0u8, 1, 2, 3]);
        let result = normalizer().normalize(&file);
        assert!(matches!(result, Err(Error::PdfOpen(_))));
    }

    #[test]
    fn test_upload_is_staged_in_scratch() {
        let scratch = Arc::new(ScratchDir::new().unwrap());
        let normalizer = Normalizer::new(Arc::clone(&scratch), NormalizeConfig::default());

        let _ = normalizer.normalize(&UploadedFile::new("broken.cbz", b"zzz".to_vec()));

        let staged: Vec<_> = std::fs::read_dir(scratch.path()).unwrap().collect();
        assert_eq!(staged.len(), 1, "scratch copy survives a failed decode");
    }
}
