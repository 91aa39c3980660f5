//! Process-lifetime scratch directory.
//!
//! Some decoders (and the Tesseract executable) need a file path rather
//! than a byte buffer, so uploads and OCR inputs are staged here. The
//! directory is created once at start-up and removed when the `ScratchDir`
//! is dropped, which in the server means at process exit. Files written
//! into it are never cleaned up individually by the normalizer.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

use crate::upload::UploadedFile;
use crate::util::sanitize_file_name;

pub struct ScratchDir {
    /// Temp directory - auto-cleaned on drop
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp dir.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("manga-translator-").tempdir()?;
        debug!("Created scratch directory at {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a scratch directory inside `parent`.
    pub fn new_in(parent: impl AsRef<Path>) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("manga-translator-")
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A unique, not-yet-existing path with the given extension.
    pub fn unique_path(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{extension}", Uuid::new_v4()))
    }

    /// Write an upload's bytes into the scratch directory.
    ///
    /// The file name keeps the sanitized original name behind a unique
    /// prefix so concurrent sessions uploading `chapter.cbz` don't collide.
    pub fn persist(&self, file: &UploadedFile) -> io::Result<PathBuf> {
        let name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&file.name));
        let path = self.dir.path().join(name);
        std::fs::write(&path, &file.bytes)?;
        debug!("Staged {} ({} bytes) at {}", file.name, file.len(), path.display());
        Ok(path)
    }
}

impl std::fmt::Debug for ScratchDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchDir")
            .field("path", &self.dir.path())
            .finish()
    }
}
