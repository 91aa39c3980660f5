use image::DynamicImage;

use crate::error::Result;

/// One fragment of recognized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub text: String,
    /// Engine confidence normalized to [0, 1]
    pub confidence: f32,
}

impl Detection {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Information about an OCR backend
#[derive(Debug, Clone)]
pub struct RecognizerInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Language models the engine was configured with
    pub languages: Vec<String>,
}

/// Trait for OCR backends.
///
/// Implementations are blocking and must be deterministic for a given
/// image and configuration.
pub trait Recognizer: Send + Sync {
    /// Get information about this recognizer
    fn info(&self) -> RecognizerInfo;

    /// Detect text fragments in reading order
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>>;
}
