//! Single image uploads.

use std::path::Path;

use image::{DynamicImage, ImageReader};

use crate::error::{Error, Result};

/// Decode an image file, sniffing the real format from its contents.
pub fn decode_file(path: &Path, name: &str) -> Result<DynamicImage> {
    ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| Error::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })?
        .decode()
        .map_err(|e| Error::Decode {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Decode an in-memory image.
pub fn decode_bytes(bytes: &[u8], name: &str) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| Error::Decode {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
