//! Uploaded files, format detection, and the upload size gate.

use bytes::Bytes;

use crate::config::UploadLimits;
use crate::error::{Error, Result};
use crate::util::lowercase_extension;

/// Extensions decoded directly as single raster pages
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One file as received from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Declared file name (only its extension drives decoding)
    pub name: String,
    /// Raw file contents
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn extension(&self) -> String {
        lowercase_extension(&self.name)
    }

    /// Content id (MD5 hex), stable for identical uploads.
    pub fn content_id(&self) -> String {
        format!("{:x}", md5::compute(&self.bytes))
    }
}

/// How an upload is turned into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// png / jpg / jpeg
    Raster,
    /// pdf
    Pdf,
    /// cbz (zip of images)
    ComicArchive,
}

impl DocumentKind {
    /// Pick a decoding policy from a lowercase extension.
    pub fn from_extension(extension: &str) -> Result<Self> {
        match extension {
            ext if RASTER_EXTENSIONS.contains(&ext) => Ok(Self::Raster),
            "pdf" => Ok(Self::Pdf),
            "cbz" => Ok(Self::ComicArchive),
            other => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    /// Pick a decoding policy from a declared file name (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self> {
        Self::from_extension(&lowercase_extension(name))
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Raster => "image",
            Self::Pdf => "PDF",
            Self::ComicArchive => "comic archive",
        }
    }
}

/// Outcome of the upload size gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    /// Within the soft limit
    Accepted,
    /// Between soft and hard limit: proceed, but warn the user
    Advisory { size: u64, soft_limit: u64 },
}

impl SizeCheck {
    /// Advisory text for the user, if any.
    #[allow(clippy::cast_precision_loss)]
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Accepted => None,
            Self::Advisory { size, soft_limit } => Some(format!(
                "Large file ({:.1} MB, more than {:.1} MB): processing may be slow.",
                *size as f64 / (1024.0 * 1024.0),
                *soft_limit as f64 / (1024.0 * 1024.0),
            )),
        }
    }
}

impl UploadLimits {
    /// Apply the size gate to an upload of `size` bytes.
    ///
    /// Uploads above the hard limit are rejected with `FileTooLarge`.
    pub fn check(&self, size: u64) -> Result<SizeCheck> {
        if size > self.hard_limit_bytes {
            Err(Error::FileTooLarge {
                size,
                limit: self.hard_limit_bytes,
            })
        } else if size > self.soft_limit_bytes {
            Ok(SizeCheck::Advisory {
                size,
                soft_limit: self.soft_limit_bytes,
            })
        } else {
            Ok(SizeCheck::Accepted)
        }
    }
}
