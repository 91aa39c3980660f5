use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Language codes following ISO 639-1 with regional variants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable language name, used in prompts and result labels.
    pub fn display_name(&self) -> &'static str {
        match self.as_str() {
            "ja" => "Japanese",
            "en" => "English",
            "ru" => "Russian",
            "zh-CN" => "Simplified Chinese",
            "zh-TW" => "Traditional Chinese",
            "ko" => "Korean",
            "fr" => "French",
            "de" => "German",
            "es" => "Spanish",
            "it" => "Italian",
            "pt" => "Portuguese",
            "uk" => "Ukrainian",
            // For unknown languages, the LLM should still understand most ISO codes
            _ => "the specified language",
        }
    }
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Lang {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "ja";
/// Default intermediate language code
pub const DEFAULT_INTERMEDIATE_LANG: &str = "en";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "ru";

fn default_source_lang() -> Lang {
    Lang::new(DEFAULT_SOURCE_LANG)
}

fn default_intermediate_lang() -> Lang {
    Lang::new(DEFAULT_INTERMEDIATE_LANG)
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

/// The three languages of the translation chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageChain {
    /// Language the OCR engine reads
    #[serde(default = "default_source_lang")]
    pub source: Lang,
    /// Output of hop 1, input of hop 2
    #[serde(default = "default_intermediate_lang")]
    pub intermediate: Lang,
    /// Output of hop 2
    #[serde(default = "default_target_lang")]
    pub target: Lang,
}

impl Default for LanguageChain {
    fn default() -> Self {
        Self {
            source: default_source_lang(),
            intermediate: default_intermediate_lang(),
            target: default_target_lang(),
        }
    }
}

/// Translator backend configuration for OpenAI-compatible APIs.
///
/// Supports llama.cpp, Ollama, DeepSeek, OpenAI, and any other OpenAI-compatible API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature; omitted from requests when unset
    pub temperature: Option<f32>,
}

impl TranslatorConfig {
    /// Create a new translator config
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key,
            model: model.into(),
            temperature: None,
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self::new(default_api_base(), None, default_model())
    }
}

/// OCR configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language models, e.g. `["jpn"]` or `["jpn", "eng"]`
    #[serde(default = "default_ocr_languages")]
    pub languages: Vec<String>,

    /// Fragments scoring at or below this confidence are discarded
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Pages wider than this are downscaled before OCR (None = never)
    #[serde(default = "default_max_width")]
    pub max_width: Option<u32>,

    /// Tesseract page segmentation mode
    #[serde(default)]
    pub psm: Option<i32>,
}

fn default_ocr_languages() -> Vec<String> {
    vec!["jpn".to_string()]
}

const fn default_min_confidence() -> f32 {
    0.1
}

#[allow(clippy::unnecessary_wraps)] // serde default must match the field type
const fn default_max_width() -> Option<u32> {
    Some(800)
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: default_ocr_languages(),
            min_confidence: default_min_confidence(),
            max_width: default_max_width(),
            psm: None,
        }
    }
}

/// Upload normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Resolution PDF pages are rasterized at
    #[serde(default = "default_pdf_dpi")]
    pub pdf_dpi: u32,
}

const fn default_pdf_dpi() -> u32 {
    120
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            pdf_dpi: default_pdf_dpi(),
        }
    }
}

/// Upload size gate
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UploadLimits {
    /// Above this size a warning is shown but the upload proceeds
    #[serde(default = "default_soft_limit")]
    pub soft_limit_bytes: u64,
    /// Above this size the upload is rejected
    #[serde(default = "default_hard_limit")]
    pub hard_limit_bytes: u64,
}

const fn default_soft_limit() -> u64 {
    5 * 1024 * 1024
}

const fn default_hard_limit() -> u64 {
    10 * 1024 * 1024
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            soft_limit_bytes: default_soft_limit(),
            hard_limit_bytes: default_hard_limit(),
        }
    }
}

/// Translation chain policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ChainConfig {
    /// When hop 1 fails, skip hop 2 instead of translating the failure text
    #[serde(default)]
    pub skip_after_failure: bool,
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub languages: LanguageChain,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub upload: UploadLimits,

    /// Hop 1 backend, also used for hop 2 unless overridden
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Optional separate backend for hop 2
    #[serde(default)]
    pub translator_second_hop: Option<TranslatorConfig>,

    #[serde(default)]
    pub chain: ChainConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/manga-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("manga-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, reason: &str| Error::ConfigInvalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if !(0.0..=1.0).contains(&self.ocr.min_confidence) {
            return Err(invalid("ocr.min_confidence", "must be between 0 and 1"));
        }
        if self.ocr.languages.is_empty() {
            return Err(invalid("ocr.languages", "at least one language is required"));
        }
        if self.ocr.max_width == Some(0) {
            return Err(invalid("ocr.max_width", "must be greater than 0"));
        }
        if self.normalize.pdf_dpi == 0 {
            return Err(invalid("normalize.pdf_dpi", "must be greater than 0"));
        }
        if self.upload.soft_limit_bytes > self.upload.hard_limit_bytes {
            return Err(invalid(
                "upload.soft_limit_bytes",
                "must not exceed upload.hard_limit_bytes",
            ));
        }
        Ok(())
    }

    /// Backend configuration for hop 2.
    pub fn second_hop_translator(&self) -> &TranslatorConfig {
        self.translator_second_hop.as_ref().unwrap_or(&self.translator)
    }
}

/// Get flag emoji for a language code.
///
/// Returns a globe emoji for unknown language codes.
pub fn flag_for_lang(code: &str) -> &'static str {
    match code {
        "ja" => "🇯🇵",
        "en" => "🇬🇧",
        "ru" => "🇷🇺",
        "fr" => "🇫🇷",
        "de" => "🇩🇪",
        "es" => "🇪🇸",
        "it" => "🇮🇹",
        "pt" => "🇵🇹",
        "ko" => "🇰🇷",
        "zh-CN" => "🇨🇳",
        "uk" => "🇺🇦",
        _ => "🌐",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.languages.source.as_str(), "ja");
        assert_eq!(config.languages.intermediate.as_str(), "en");
        assert_eq!(config.languages.target.as_str(), "ru");
        assert_eq!(config.ocr.languages, vec!["jpn".to_string()]);
        assert!((config.ocr.min_confidence - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.ocr.max_width, Some(800));
        assert_eq!(config.normalize.pdf_dpi, 120);
        assert_eq!(config.upload.hard_limit_bytes, 10 * 1024 * 1024);
        assert!(!config.chain.skip_after_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [ocr]
            languages = ["jpn", "eng"]

            [translator]
            model = "local-model"
            "#,
        )
        .unwrap();

        assert_eq!(config.ocr.languages.len(), 2);
        assert_eq!(config.ocr.max_width, Some(800));
        assert_eq!(config.translator.model, "local-model");
        assert_eq!(config.translator.api_base, "http://localhost:8080/v1");
        assert_eq!(config.languages.target.as_str(), "ru");
    }

    #[test]
    fn test_second_hop_falls_back_to_first() {
        let mut config = AppConfig::default();
        assert_eq!(config.second_hop_translator().model, "gpt-4o-mini");

        config.translator_second_hop = Some(TranslatorConfig::new("http://other/v1", None, "ru-model"));
        assert_eq!(config.second_hop_translator().model, "ru-model");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let result = AppConfig::from_toml("[ocr]\nmin_confidence = 1.5\n");
        assert!(matches!(result, Err(Error::ConfigInvalid { ref field, .. }) if field == "ocr.min_confidence"));

        let result = AppConfig::from_toml("[normalize]\npdf_dpi = 0\n");
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));

        let result = AppConfig::from_toml(
            "[upload]\nsoft_limit_bytes = 100\nhard_limit_bytes = 10\n",
        );
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
    }

    #[test]
    fn test_invalid_toml_is_load_error() {
        let result = AppConfig::from_toml("[ocr\n");
        assert!(matches!(result, Err(Error::ConfigLoad(_))));
    }

    #[test]
    fn test_language_names() {
        assert_eq!(Lang::new("ja").display_name(), "Japanese");
        assert_eq!(Lang::new("ru").display_name(), "Russian");
        assert_eq!(Lang::new("xx").display_name(), "the specified language");
        assert_eq!(flag_for_lang("ru"), "🇷🇺");
        assert_eq!(flag_for_lang("xx"), "🌐");
    }
}
