//! Comic archives (`.cbz`): a zip of page images.
//!
//! Archives carry no page order metadata, so entry names sorted
//! lexicographically are the reading order.

use std::io::{Read, Seek};

use image::DynamicImage;
use tracing::debug;
use zip::ZipArchive;

use super::raster;
use crate::error::{Error, Result};
use crate::upload::RASTER_EXTENSIONS;
use crate::util::lowercase_extension;

/// Whether an archive entry name is a page image.
pub fn is_page_entry(name: &str) -> bool {
    !name.ends_with('/') && RASTER_EXTENSIONS.contains(&lowercase_extension(name).as_str())
}

/// Names of the page entries, in reading order.
pub fn page_entry_names<R: Read + Seek>(archive: &ZipArchive<R>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| is_page_entry(name))
        .map(str::to_string)
        .collect();
    names.sort();
    names
}

/// Decode every page image of an archive in reading order.
pub fn decode_pages<R: Read + Seek>(reader: R) -> Result<Vec<DynamicImage>> {
    let mut archive = ZipArchive::new(reader).map_err(|e| Error::Archive(e.to_string()))?;
    let names = page_entry_names(&archive);
    debug!("Archive has {} entries, {} pages", archive.len(), names.len());

    let mut pages = Vec::with_capacity(names.len());
    for name in &names {
        let mut entry = archive
            .by_name(name)
            .map_err(|e| Error::Archive(format!("{name}: {e}")))?;

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| Error::Archive(format!("{name}: {e}")))?;

        pages.push(raster::decode_bytes(&bytes, name)?);
    }

    Ok(pages)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_is_page_entry() {
        assert!(is_page_entry("001.png"));
        assert!(is_page_entry("ch1/002.JPG"));
        assert!(is_page_entry("cover.jpeg"));
        assert!(!is_page_entry("ComicInfo.xml"));
        assert!(!is_page_entry("thumbs.db"));
        assert!(!is_page_entry("images.png/"));
    }

    #[test]
    fn test_entry_names_sorted_and_filtered() {
        let bytes = zip_with(&[
            ("10.png", b""),
            ("02.jpg", b""),
            ("ComicInfo.xml", b""),
            ("01.PNG", b""),
        ]);
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(page_entry_names(&archive), vec!["01.PNG", "02.jpg", "10.png"]);
    }

    #[test]
    fn test_not_a_zip() {
        let result = decode_pages(Cursor::new(b"definitely not a zip".to_vec()));
        assert!(matches!(result, Err(Error::Archive(_))));
    }

    #[test]
    fn test_corrupt_page_fails_whole_archive() {
        let bytes = zip_with(&[("01.png", b"garbage")]);
        let result = decode_pages(Cursor::new(bytes));
        assert!(matches!(result, Err(Error::Decode { ref name, .. }) if name == "01.png"));
    }
}
