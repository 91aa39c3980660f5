mod stage;
mod tesseract;
mod traits;

pub use stage::{RecognitionResult, RecognitionStage, downscale_for_ocr};
pub use tesseract::TesseractRecognizer;
pub use traits::{Detection, Recognizer, RecognizerInfo};

use crate::config::OcrConfig;
use crate::error::Result;
use crate::scratch::ScratchDir;
use std::sync::Arc;
use tracing::warn;

/// Create the OCR backend from configuration.
///
/// A missing engine is logged, not fatal: recognition requests then fail
/// with a message while uploads and browsing keep working.
pub fn create_recognizer(
    config: &OcrConfig,
    scratch: Arc<ScratchDir>,
) -> Result<Arc<dyn Recognizer>> {
    let recognizer = TesseractRecognizer::new(config, scratch);
    if let Err(e) = recognizer.check_available() {
        warn!("{}; page recognition will fail until Tesseract is installed", e);
    }
    Ok(Arc::new(recognizer))
}
