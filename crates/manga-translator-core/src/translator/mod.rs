mod chain;
mod openai;
mod traits;

pub use chain::{
    HopOutcome, TranslationChain, TranslationResult, TRANSLATION_FAILED, TRANSLATION_SKIPPED,
};
pub use openai::OpenAiTranslator;
pub use traits::{Translator, TranslatorInfo};

use crate::config::TranslatorConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create a translator from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let translator = OpenAiTranslator::new(
        config.api_base.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.temperature,
    )?;

    Ok(Arc::new(translator))
}
