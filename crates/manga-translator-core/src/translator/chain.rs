//! Two-hop translation: source -> intermediate -> target.
//!
//! Each hop is independently fault tolerant. A failed hop becomes
//! `HopOutcome::Failed`, and unless `skip_after_failure` is set, hop 2 is
//! still called with hop 1's display text, which is then the literal
//! `TRANSLATION_FAILED` sentinel.

use std::sync::Arc;

use tracing::{info, warn};

use super::traits::Translator;
use crate::config::{ChainConfig, LanguageChain, Lang};

/// Displayed in place of a hop that failed
pub const TRANSLATION_FAILED: &str = "translation failed";
/// Displayed in place of a hop that was not attempted
pub const TRANSLATION_SKIPPED: &str = "translation skipped";

/// Result of one hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopOutcome {
    Translated(String),
    Failed { reason: String },
    Skipped,
}

impl HopOutcome {
    /// Text shown to the user and fed to the next hop.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Translated(text) => text,
            Self::Failed { .. } => TRANSLATION_FAILED,
            Self::Skipped => TRANSLATION_SKIPPED,
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Failure reason, if the hop failed.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// (source, intermediate, target) for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub source: String,
    pub intermediate: HopOutcome,
    pub target: HopOutcome,
}

/// The two translation hops and their languages.
#[derive(Clone)]
pub struct TranslationChain {
    first_hop: Arc<dyn Translator>,
    second_hop: Arc<dyn Translator>,
    languages: LanguageChain,
    policy: ChainConfig,
}

impl TranslationChain {
    pub fn new(
        first_hop: Arc<dyn Translator>,
        second_hop: Arc<dyn Translator>,
        languages: LanguageChain,
        policy: ChainConfig,
    ) -> Self {
        Self {
            first_hop,
            second_hop,
            languages,
            policy,
        }
    }

    /// Use the same backend for both hops.
    pub fn with_translator(
        translator: Arc<dyn Translator>,
        languages: LanguageChain,
        policy: ChainConfig,
    ) -> Self {
        Self::new(Arc::clone(&translator), translator, languages, policy)
    }

    pub const fn languages(&self) -> &LanguageChain {
        &self.languages
    }

    /// Run both hops in order. Never fails.
    pub async fn translate_chain(&self, source_text: &str) -> TranslationResult {
        let intermediate = run_hop(
            self.first_hop.as_ref(),
            source_text,
            &self.languages.source,
            &self.languages.intermediate,
        )
        .await;

        let target = if intermediate.is_failed() && self.policy.skip_after_failure {
            info!("Skipping second hop after first hop failure");
            HopOutcome::Skipped
        } else {
            run_hop(
                self.second_hop.as_ref(),
                intermediate.display_text(),
                &self.languages.intermediate,
                &self.languages.target,
            )
            .await
        };

        TranslationResult {
            source: source_text.to_string(),
            intermediate,
            target,
        }
    }
}

async fn run_hop(translator: &dyn Translator, text: &str, source: &Lang, target: &Lang) -> HopOutcome {
    match translator.translate(text, source, target).await {
        Ok(translated) => HopOutcome::Translated(translated),
        Err(e) => {
            warn!(
                "Translation hop {} -> {} via {} failed: {}",
                source,
                target,
                translator.name(),
                e
            );
            HopOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
