//! Manga Translator Core Library
//!
//! This library provides the core functionality for translating manga pages:
//! - Upload normalization (images, PDF, CBZ) into page images
//! - OCR of a selected page via a pluggable recognizer (Tesseract by default)
//! - A two-hop translation chain via OpenAI-compatible APIs

pub mod config;
pub mod error;
pub mod normalize;
pub mod ocr;
pub mod page;
pub mod pdf;
pub mod scratch;
pub mod translator;
pub mod upload;
pub mod util;

pub use config::{AppConfig, Lang, LanguageChain, OcrConfig, TranslatorConfig, flag_for_lang};
pub use error::{Error, Result};
pub use normalize::Normalizer;
pub use ocr::{Detection, RecognitionResult, RecognitionStage, Recognizer, create_recognizer};
pub use page::{PageImage, PageSequence};
pub use scratch::ScratchDir;
pub use translator::{
    HopOutcome, OpenAiTranslator, TranslationChain, TranslationResult, Translator,
    create_translator,
};
pub use upload::{DocumentKind, SizeCheck, UploadedFile};

use std::sync::Arc;
use tracing::{debug, info};

/// Displayed for all three outputs when a page has no recognizable text
pub const NO_TEXT_FOUND: &str = "no text found";

/// What recognizing and translating one page produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// OCR found nothing above the confidence threshold; no hop was called
    NoTextFound,
    Translated(TranslationResult),
}

impl PageOutcome {
    pub fn source_text(&self) -> &str {
        match self {
            Self::NoTextFound => NO_TEXT_FOUND,
            Self::Translated(result) => &result.source,
        }
    }

    pub fn intermediate_text(&self) -> &str {
        match self {
            Self::NoTextFound => NO_TEXT_FOUND,
            Self::Translated(result) => result.intermediate.display_text(),
        }
    }

    pub fn target_text(&self) -> &str {
        match self {
            Self::NoTextFound => NO_TEXT_FOUND,
            Self::Translated(result) => result.target.display_text(),
        }
    }

    /// The three displayed outputs (source, intermediate, target).
    pub fn texts(&self) -> (&str, &str, &str) {
        (self.source_text(), self.intermediate_text(), self.target_text())
    }
}

/// High-level page translator that combines recognition and the chain
pub struct MangaTranslator {
    recognition: RecognitionStage,
    chain: TranslationChain,
}

impl MangaTranslator {
    /// Build the production pipeline (Tesseract + OpenAI-compatible hops).
    pub fn new(config: &AppConfig, scratch: Arc<ScratchDir>) -> Result<Self> {
        let recognizer = create_recognizer(&config.ocr, scratch)?;
        let first_hop = create_translator(&config.translator)?;
        let second_hop = create_translator(config.second_hop_translator())?;

        let chain = TranslationChain::new(
            first_hop,
            second_hop,
            config.languages.clone(),
            config.chain,
        );

        Ok(Self::with_components(recognizer, chain, &config.ocr))
    }

    /// Create with custom backends
    pub fn with_components(
        recognizer: Arc<dyn Recognizer>,
        chain: TranslationChain,
        ocr: &OcrConfig,
    ) -> Self {
        Self {
            recognition: RecognitionStage::new(recognizer, ocr),
            chain,
        }
    }

    pub const fn chain(&self) -> &TranslationChain {
        &self.chain
    }

    /// Recognize a page's text on a blocking thread.
    pub async fn recognize(&self, page: &PageImage) -> Result<RecognitionResult> {
        let stage = self.recognition.clone();
        let image = page.image.clone();

        tokio::task::spawn_blocking(move || stage.recognize(&image))
            .await
            .map_err(|e| Error::Ocr(format!("OCR task panicked: {e}")))?
    }

    /// Recognize a page and run the translation chain on its text.
    ///
    /// Blank recognition short-circuits to `PageOutcome::NoTextFound`
    /// without calling either hop. Translation failures never surface as
    /// errors; only OCR failures do.
    pub async fn process_page(&self, page: &PageImage) -> Result<PageOutcome> {
        let recognized = self.recognize(page).await?;

        if recognized.is_blank() {
            info!("No text found on page {}", page.index + 1);
            return Ok(PageOutcome::NoTextFound);
        }

        let source_text = recognized.text();
        debug!(
            "Recognized {} fragments on page {}",
            recognized.fragments.len(),
            page.index + 1
        );

        let result = self.chain.translate_chain(&source_text).await;
        info!(
            "Translated page {} ({} chars){}",
            page.index + 1,
            source_text.chars().count(),
            if result.intermediate.is_failed() || result.target.is_failed() {
                " with failed hops"
            } else {
                ""
            }
        );

        Ok(PageOutcome::Translated(result))
    }

    /// Process a page of a sequence by 0-based index (bounds-checked).
    pub async fn process_index(&self, pages: &PageSequence, index: usize) -> Result<PageOutcome> {
        let page = pages.get(index)?;
        self.process_page(page).await
    }
}
