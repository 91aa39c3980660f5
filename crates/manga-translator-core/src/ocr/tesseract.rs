//! Tesseract backend, driven through the `tesseract` executable.

use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use rusty_tesseract::{Args, Data, Image};
use tracing::{debug, info, warn};

use super::traits::{Detection, Recognizer, RecognizerInfo};
use crate::config::OcrConfig;
use crate::error::{Error, Result};
use crate::scratch::ScratchDir;

/// Tesseract reports confidence on a 0-100 scale; non-word rows use -1
const TESSERACT_CONFIDENCE_SCALE: f32 = 100.0;

/// Languages written without spaces between words
const UNSPACED_SCRIPTS: &[&str] = &["jpn", "jpn_vert", "chi_sim", "chi_sim_vert", "chi_tra", "chi_tra_vert"];

/// `(page, block, paragraph, line)` as numbered by Tesseract
type LineKey = (i32, i32, i32, i32);

/// One word row of Tesseract's data output
#[derive(Debug, Clone)]
struct WordRow {
    line: LineKey,
    conf: f32,
    text: String,
}

impl From<Data> for WordRow {
    fn from(row: Data) -> Self {
        Self {
            line: (row.page_num, row.block_num, row.par_num, row.line_num),
            conf: row.conf,
            text: row.text,
        }
    }
}

/// Separator placed between words of one line.
fn word_separator(languages: &[String]) -> &'static str {
    let unspaced = !languages.is_empty()
        && languages
            .iter()
            .all(|lang| UNSPACED_SCRIPTS.contains(&lang.as_str()));
    if unspaced { "" } else { " " }
}

/// Merge word rows into one detection per text line.
///
/// Rows arrive in reading order, so a line is a run of rows sharing a key.
/// Non-word rows (negative confidence) and blank words are dropped; a line's
/// confidence is the mean of its words.
fn line_detections(rows: impl IntoIterator<Item = WordRow>, separator: &str) -> Vec<Detection> {
    let mut lines: Vec<(LineKey, Vec<WordRow>)> = Vec::new();

    for row in rows {
        if row.conf < 0.0 || row.text.trim().is_empty() {
            continue;
        }
        let same_line = lines.last().is_some_and(|(key, _)| *key == row.line);
        if same_line {
            if let Some((_, words)) = lines.last_mut() {
                words.push(row);
            }
        } else {
            lines.push((row.line, vec![row]));
        }
    }

    lines
        .into_iter()
        .map(|(_, words)| {
            let text = words
                .iter()
                .map(|w| w.text.trim())
                .collect::<Vec<_>>()
                .join(separator);
            #[allow(clippy::cast_precision_loss)] // word counts are small
            let mean = words.iter().map(|w| w.conf).sum::<f32>() / words.len() as f32;
            Detection::new(text, (mean / TESSERACT_CONFIDENCE_SCALE).clamp(0.0, 1.0))
        })
        .collect()
}

/// OCR via Tesseract with a fixed language set (e.g. `jpn`).
///
/// Pages are staged as PNG files in the scratch directory because the
/// engine reads from a path.
pub struct TesseractRecognizer {
    scratch: Arc<ScratchDir>,
    languages: Vec<String>,
    psm: Option<i32>,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig, scratch: Arc<ScratchDir>) -> Self {
        Self {
            scratch,
            languages: config.languages.clone(),
            psm: config.psm,
        }
    }

    /// Tesseract's `-l` argument: language models joined with `+`
    pub fn lang_arg(&self) -> String {
        self.languages.join("+")
    }

    fn args(&self) -> Args {
        let defaults = Args::default();
        Args {
            lang: self.lang_arg(),
            psm: self.psm.or(defaults.psm),
            ..defaults
        }
    }

    /// Verify the engine can be started.
    pub fn check_available(&self) -> Result<()> {
        let version = rusty_tesseract::get_tesseract_version()
            .map_err(|e| Error::OcrUnavailable(e.to_string()))?;
        info!(
            "Using Tesseract {} with languages {}",
            version.lines().next().unwrap_or_default(),
            self.lang_arg()
        );
        Ok(())
    }
}

impl Recognizer for TesseractRecognizer {
    fn info(&self) -> RecognizerInfo {
        RecognizerInfo {
            name: "Tesseract",
            languages: self.languages.clone(),
        }
    }

    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let path = self.scratch.unique_path("png");
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| Error::Ocr(format!("Failed to stage page for OCR: {e}")))?;

        let result = Image::from_path(&path)
            .and_then(|staged| rusty_tesseract::image_to_data(&staged, &self.args()));

        if let Err(e) = std::fs::remove_file(&path) {
            warn!("Failed to remove staged OCR input {}: {}", path.display(), e);
        }

        let output = result.map_err(|e| match self.check_available() {
            Err(unavailable) => unavailable,
            Ok(()) => Error::Ocr(e.to_string()),
        })?;

        let row_count = output.data.len();
        let detections = line_detections(
            output.data.into_iter().map(WordRow::from),
            word_separator(&self.languages),
        );

        debug!(
            "Tesseract returned {} rows in {} lines",
            row_count,
            detections.len()
        );
        Ok(detections)
    }
}
