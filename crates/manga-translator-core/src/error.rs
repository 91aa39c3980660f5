use thiserror::Error;

/// Unified error type for manga-translator-core
///
/// Every variant is recovered at the boundary where it occurs and shown to
/// the user as a message:
/// - Upload normalization (unsupported formats, corrupt files, empty documents)
/// - OCR engine failures
/// - Translation hop failures (non-fatal inside the chain)
/// - Configuration loading and validation
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Upload / Normalization Errors
    // ==========================================================================
    /// File extension is not one of png, jpg, jpeg, pdf, cbz
    #[error("unsupported file format: .{extension}")]
    UnsupportedFormat { extension: String },

    /// Upload exceeds the hard size limit
    #[error("file is too large ({size} bytes, limit is {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// Corrupt or unreadable image data
    #[error("failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },

    /// Comic archive could not be read
    #[error("failed to read archive: {0}")]
    Archive(String),

    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Failed to render a PDF page
    #[error("failed to render page {page}: {reason}")]
    PdfRender { page: usize, reason: String },

    /// The document decoded fine but produced no pages
    #[error("document contains no pages")]
    EmptyDocument,

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    InvalidPage { page: usize, total: usize },

    // ==========================================================================
    // OCR Errors
    // ==========================================================================
    /// The OCR engine failed on a page
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// The OCR engine is not installed or cannot be started
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error was caused by the uploaded file itself rather than
    /// by the server (used to pick 4xx vs 5xx in the web layer).
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::FileTooLarge { .. }
                | Self::Decode { .. }
                | Self::Archive(_)
                | Self::PdfOpen(_)
                | Self::PdfRender { .. }
                | Self::EmptyDocument
                | Self::InvalidPage { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
