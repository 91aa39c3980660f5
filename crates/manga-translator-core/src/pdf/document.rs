use std::path::Path;

use mupdf::Document as MuDocument;

use crate::error::{Error, Result};

/// An opened PDF. Not `Send`: open, render and drop it on one blocking thread.
pub struct PdfDocument {
    inner: MuDocument,
    page_count: usize,
}

impl PdfDocument {
    /// Open the staged copy of an upload.
    pub fn open(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::PdfOpen(format!("non UTF-8 path {}", path.display())))?;

        let inner = MuDocument::open(path_str).map_err(|e| Error::PdfOpen(e.to_string()))?;
        let count = inner
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("unreadable page tree: {e}")))?;

        Ok(Self {
            inner,
            page_count: usize::try_from(count).unwrap_or(0),
        })
    }

    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    pub(crate) const fn inner(&self) -> &MuDocument {
        &self.inner
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_count)
            .finish_non_exhaustive()
    }
}
