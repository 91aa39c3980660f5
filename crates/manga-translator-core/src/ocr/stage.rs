use std::sync::Arc;

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

use super::traits::{Detection, Recognizer};
use crate::config::OcrConfig;
use crate::error::Result;

/// Fragments that survived the confidence filter, in detection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    pub fragments: Vec<Detection>,
}

impl RecognitionResult {
    /// Surviving fragments joined with single spaces.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when no usable text was recognized.
    pub fn is_blank(&self) -> bool {
        self.fragments.iter().all(|d| d.text.trim().is_empty())
    }
}

/// Shrink `image` to `max_width` (keeping aspect ratio) if it is wider.
///
/// Returns `None` when the image is already narrow enough.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn downscale_for_ocr(image: &DynamicImage, max_width: u32) -> Option<DynamicImage> {
    if image.width() <= max_width {
        return None;
    }

    let ratio = f64::from(max_width) / f64::from(image.width());
    let height = ((f64::from(image.height()) * ratio) as u32).max(1);

    Some(image.resize_exact(max_width, height, FilterType::Lanczos3))
}

/// Runs OCR on one page: optional downscale, detect, confidence filter.
#[derive(Clone)]
pub struct RecognitionStage {
    recognizer: Arc<dyn Recognizer>,
    min_confidence: f32,
    max_width: Option<u32>,
}

impl RecognitionStage {
    pub fn new(recognizer: Arc<dyn Recognizer>, config: &OcrConfig) -> Self {
        Self {
            recognizer,
            min_confidence: config.min_confidence,
            max_width: config.max_width,
        }
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.info().name
    }

    /// Recognize the text on one page. Blocking.
    pub fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult> {
        let resized = self.max_width.and_then(|w| downscale_for_ocr(image, w));
        if let Some(ref small) = resized {
            debug!(
                "Downscaled page from {}x{} to {}x{} for OCR",
                image.width(),
                image.height(),
                small.width(),
                small.height()
            );
        }
        let input = resized.as_ref().unwrap_or(image);

        let detections = self.recognizer.detect(input)?;
        let total = detections.len();

        let fragments: Vec<Detection> = detections
            .into_iter()
            .filter(|d| d.confidence > self.min_confidence)
            .collect();

        debug!(
            "{} kept {}/{} fragments above confidence {}",
            self.recognizer_name(),
            fragments.len(),
            total,
            self.min_confidence
        );

        Ok(RecognitionResult { fragments })
    }
}
