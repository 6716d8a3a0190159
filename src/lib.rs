//! mdpress: the content index behind a markdown-driven personal blog
//!
//! Markdown files under the content root are parsed into [`content::BlogPost`]
//! values and served from an atomically refreshed [`index::ContentIndex`].
//! Tag badges come from an independent [`tags::TagCollections`] resolver.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod i18n;
pub mod index;
pub mod tags;

use anyhow::Result;
use std::path::Path;

/// The blog application handle
#[derive(Clone)]
pub struct Blog {
    /// Blog configuration
    pub config: config::BlogConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Content root
    pub content_dir: std::path::PathBuf,
}

impl Blog {
    /// Create a new Blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::BlogConfig::load(&config_path)?
        } else {
            config::BlogConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
        })
    }

    /// Build and populate the content index
    pub fn index(&self) -> index::ContentIndex {
        index::ContentIndex::open(self)
    }

    /// Tag collection resolver for this blog
    pub fn tag_collections(&self) -> tags::TagCollections {
        tags::TagCollections::for_blog(self)
    }

    /// Language normalization rules for this blog
    pub fn languages(&self) -> i18n::Languages {
        i18n::Languages::from_config(&self.config)
    }
}
