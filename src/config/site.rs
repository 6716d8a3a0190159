//! Blog configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    // Site
    pub title: String,
    pub author: String,

    // Content
    pub content_dir: String,
    /// Leading path segments stripped (at most one) before column derivation
    pub column_prefixes: Vec<String>,
    /// Path segment marking daily posts
    pub daily_dir: String,
    pub summary_length: usize,
    pub excerpt_length: usize,

    // Language
    pub languages: Vec<String>,
    pub default_language: String,

    // Tag collections, first existing file wins
    pub tag_collections: Vec<String>,

    #[serde(default)]
    pub highlight: HighlightConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            author: String::new(),

            content_dir: "content".to_string(),
            column_prefixes: vec!["posts".to_string(), "columns".to_string()],
            daily_dir: "daily".to_string(),
            summary_length: 160,
            excerpt_length: 280,

            languages: vec!["en".to_string(), "zh".to_string()],
            default_language: "en".to_string(),

            tag_collections: vec![
                "content/tag_collections.yaml".to_string(),
                "content/tag_collections.yml".to_string(),
                "content/tag_collections.json".to_string(),
                "content/tag_collections.toml".to_string(),
            ],

            highlight: HighlightConfig::default(),
            extra: HashMap::new(),
        }
    }
}

impl BlogConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: BlogConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

/// Fenced code block highlighting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub line_number: bool,
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            line_number: false,
            theme: "base16-ocean.dark".to_string(),
        }
    }
}
