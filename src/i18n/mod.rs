//! Language code normalization

use crate::config::BlogConfig;

/// Supported post languages and the fallback used for anything else
#[derive(Debug, Clone)]
pub struct Languages {
    supported: Vec<String>,
    default: String,
}

impl Languages {
    /// Create from an explicit list of two-letter codes
    pub fn new(supported: Vec<String>, default: &str) -> Self {
        let supported = supported
            .into_iter()
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .collect();
        Self {
            supported,
            default: default.trim().to_lowercase(),
        }
    }

    pub fn from_config(config: &BlogConfig) -> Self {
        Self::new(config.languages.clone(), &config.default_language)
    }

    /// The fallback language code
    pub fn default_language(&self) -> &str {
        &self.default
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    /// Normalize a raw `lang` value to a supported two-letter code.
    ///
    /// `"zh-CN"` becomes `"zh"`, `" EN "` becomes `"en"`, and unknown or
    /// missing values fall back to the default language.
    pub fn normalize(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return self.default.clone();
        };
        let code: String = raw.trim().to_lowercase().chars().take(2).collect();
        if self.supported.iter().any(|lang| *lang == code) {
            code
        } else {
            self.default.clone()
        }
    }

    /// Human readable name for a language code
    pub fn display_name(code: &str) -> &str {
        match code {
            "en" => "English",
            "zh" => "中文",
            "ja" => "日本語",
            "fr" => "Français",
            "de" => "Deutsch",
            "es" => "Español",
            other => other,
        }
    }
}

impl Default for Languages {
    fn default() -> Self {
        Self::from_config(&BlogConfig::default())
    }
}
