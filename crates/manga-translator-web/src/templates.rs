//! Askama templates for HTMX responses.
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with CSS/JS
//! - `index.html` - Landing page with upload form
//! - `app.html` - Viewer after upload: page image, navigation, recognize button
//! - `partials/` - Fragments swapped in by HTMX (results, upload errors)

use askama::Template;
use askama_web::WebTemplate;
use manga_translator_core::config::{LanguageChain, UploadLimits};
use manga_translator_core::{HopOutcome, Lang, NO_TEXT_FOUND, PageOutcome, flag_for_lang};

const MIB: u64 = 1024 * 1024;

/// Human-readable size limit for the upload form.
pub fn format_limit(bytes: u64) -> String {
    if bytes % MIB == 0 {
        format!("{} MiB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// "Japanese 🇯🇵" style label for a language
fn language_label(lang: &Lang) -> String {
    format!("{} {}", lang.display_name(), flag_for_lang(lang.as_str()))
}

// =============================================================================
// Full Page Templates
// =============================================================================

/// Landing page with upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub error: Option<String>,
    pub soft_limit: String,
    pub hard_limit: String,
}

impl IndexTemplate {
    pub fn new(limits: &UploadLimits) -> Self {
        Self {
            error: None,
            soft_limit: format_limit(limits.soft_limit_bytes),
            hard_limit: format_limit(limits.hard_limit_bytes),
        }
    }

    /// Re-render the form with an error (non-HTMX upload fallback).
    pub fn with_error(limits: &UploadLimits, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(limits)
        }
    }
}

/// Viewer page for one session.
#[derive(Template, WebTemplate)]
#[template(path = "app.html")]
pub struct AppTemplate {
    pub session_id: String,
    pub filename: String,
    pub page_count: usize,
    /// 0-based current page
    pub page: usize,
    pub size_warning: Option<String>,
    pub source_label: String,
    pub intermediate_label: String,
    pub target_label: String,
}

impl AppTemplate {
    pub fn at_page(
        session_id: String,
        filename: String,
        page_count: usize,
        page: usize,
        size_warning: Option<String>,
        languages: &LanguageChain,
    ) -> Self {
        Self {
            session_id,
            filename,
            page_count,
            page,
            size_warning,
            source_label: language_label(&languages.source),
            intermediate_label: language_label(&languages.intermediate),
            target_label: language_label(&languages.target),
        }
    }

    /// 1-based number of the current page (for URLs and display).
    pub const fn page_number(&self) -> usize {
        self.page + 1
    }

    pub const fn has_prev(&self) -> bool {
        self.page > 0
    }

    pub const fn has_next(&self) -> bool {
        self.page + 1 < self.page_count
    }
}

// =============================================================================
// Fragment Templates (HTMX partial responses)
// =============================================================================

/// One labeled output block.
pub struct TextBlock {
    pub label: String,
    pub text: String,
    pub failed: bool,
    /// Failure reason, shown as a tooltip
    pub detail: Option<String>,
}

impl TextBlock {
    fn plain(label: String, text: &str) -> Self {
        Self {
            label,
            text: text.to_string(),
            failed: false,
            detail: None,
        }
    }

    fn from_hop(label: String, hop: &HopOutcome) -> Self {
        Self {
            label,
            text: hop.display_text().to_string(),
            failed: hop.is_failed(),
            detail: hop.failure_reason().map(str::to_string),
        }
    }
}

/// Result panel after "Recognize & translate".
///
/// Also used for error display when `is_error` is true.
#[derive(Template, WebTemplate)]
#[template(path = "partials/result.html")]
pub struct ResultTemplate {
    /// 1-based page number
    pub page: usize,
    pub is_error: bool,
    pub message: String,
    pub blocks: Vec<TextBlock>,
}

impl ResultTemplate {
    pub fn from_outcome(page: usize, outcome: &PageOutcome, languages: &LanguageChain) -> Self {
        let source = language_label(&languages.source);
        let intermediate = language_label(&languages.intermediate);
        let target = language_label(&languages.target);

        let (message, blocks) = match outcome {
            PageOutcome::NoTextFound => (
                "No text found on this page".to_string(),
                vec![
                    TextBlock::plain(source, NO_TEXT_FOUND),
                    TextBlock::plain(intermediate, NO_TEXT_FOUND),
                    TextBlock::plain(target, NO_TEXT_FOUND),
                ],
            ),
            PageOutcome::Translated(result) => (
                "Translation complete".to_string(),
                vec![
                    TextBlock::plain(source, &result.source),
                    TextBlock::from_hop(intermediate, &result.intermediate),
                    TextBlock::from_hop(target, &result.target),
                ],
            ),
        };

        Self {
            page,
            is_error: false,
            message,
            blocks,
        }
    }

    pub const fn error(page: usize, error: String) -> Self {
        Self {
            page,
            is_error: true,
            message: error,
            blocks: Vec::new(),
        }
    }
}

/// Upload failure shown under the form (HTMX uploads).
#[derive(Template, WebTemplate)]
#[template(path = "partials/upload_error.html")]
pub struct UploadErrorTemplate {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use manga_translator_core::TranslationResult;
    use manga_translator_core::translator::TRANSLATION_FAILED;

    #[test]
    fn test_format_limit() {
        assert_eq!(format_limit(10 * MIB), "10 MiB");
        assert_eq!(format_limit(1500), "1500 bytes");
    }

    #[test]
    fn test_no_text_result_renders_sentinel_three_times() {
        let html = ResultTemplate::from_outcome(1, &PageOutcome::NoTextFound, &LanguageChain::default())
            .render()
            .unwrap();
        assert_eq!(html.matches(NO_TEXT_FOUND).count(), 3);
        assert!(html.contains("Japanese"));
        assert!(html.contains("Russian"));
    }

    #[test]
    fn test_failed_hop_is_marked() {
        let outcome = PageOutcome::Translated(TranslationResult {
            source: "猫".to_string(),
            intermediate: HopOutcome::Failed {
                reason: "HTTP 500".to_string(),
            },
            target: HopOutcome::Translated("кот".to_string()),
        });
        let template = ResultTemplate::from_outcome(2, &outcome, &LanguageChain::default());
        assert!(template.blocks[1].failed);
        assert_eq!(template.blocks[1].detail.as_deref(), Some("HTTP 500"));

        let html = template.render().unwrap();
        assert!(html.contains(TRANSLATION_FAILED));
        assert!(html.contains("кот"));
    }

    #[test]
    fn test_result_escapes_recognized_text() {
        let outcome = PageOutcome::Translated(TranslationResult {
            source: "<script>".to_string(),
            intermediate: HopOutcome::Translated("a".to_string()),
            target: HopOutcome::Translated("b".to_string()),
        });
        let html = ResultTemplate::from_outcome(1, &outcome, &LanguageChain::default())
            .render()
            .unwrap();
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_app_navigation_bounds() {
        let languages = LanguageChain::default();
        let first = AppTemplate::at_page("s".into(), "f.cbz".into(), 3, 0, None, &languages);
        assert!(!first.has_prev() && first.has_next());
        assert_eq!(first.page_number(), 1);

        let last = AppTemplate::at_page("s".into(), "f.cbz".into(), 3, 2, None, &languages);
        assert!(last.has_prev() && !last.has_next());
    }
}
