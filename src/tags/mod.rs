//! Tag collections - groups tags under a named, colored badge
//!
//! The mapping is read from the first existing file in a candidate list
//! (YAML, JSON or TOML) shaped like:
//!
//! ```yaml
//! collections:
//!   - name: Systems
//!     slug: systems
//!     color: "#d33"
//!     tags: [rust, c, zig]
//! ```

use arc_swap::ArcSwapOption;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::content::MetaValue;
use crate::Blog;

/// Errors reading a collections file
#[derive(Error, Debug)]
pub enum TagCollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unexpected format: {0}")]
    Format(String),
}

/// A named set of tags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCollection {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Display wrapper for one tag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagBadge {
    /// Tag as written in the post
    pub tag: String,
    /// Collection name when the tag belongs to one, else the tag itself
    pub label: String,
    pub collection: Option<Arc<TagCollection>>,
}

/// Lower-cased tag -> collection
type TagMap = HashMap<String, Arc<TagCollection>>;

/// Resolves tags to collections, loading the config on first use
pub struct TagCollections {
    candidates: Vec<PathBuf>,
    mapping: ArcSwapOption<TagMap>,
}

impl TagCollections {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            mapping: ArcSwapOption::empty(),
        }
    }

    /// Resolver for a blog's configured candidate files
    pub fn for_blog(blog: &Blog) -> Self {
        Self::new(
            blog.config
                .tag_collections
                .iter()
                .map(|path| blog.base_dir.join(path))
                .collect(),
        )
    }

    /// Drop the loaded mapping; the next lookup reads the file again
    pub fn invalidate(&self) {
        self.mapping.store(None);
    }

    /// Re-read the collections file now
    pub fn reload(&self) {
        self.mapping.store(Some(Arc::new(self.load())));
    }

    /// Badge per tag, in input order, duplicates kept
    pub fn build_badges(&self, tags: &[String]) -> Vec<TagBadge> {
        let mapping = self.mapping();
        tags.iter()
            .map(|tag| {
                let collection = mapping.get(&tag.to_lowercase()).cloned();
                TagBadge {
                    tag: tag.clone(),
                    label: collection
                        .as_ref()
                        .map(|c| c.name.clone())
                        .unwrap_or_else(|| tag.clone()),
                    collection,
                }
            })
            .collect()
    }

    /// Distinct collections, ordered by name
    pub fn collections(&self) -> Vec<Arc<TagCollection>> {
        let mapping = self.mapping();
        let mut collections: Vec<Arc<TagCollection>> = Vec::new();
        for collection in mapping.values() {
            if !collections.iter().any(|c| c.slug == collection.slug) {
                collections.push(Arc::clone(collection));
            }
        }
        collections.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        collections
    }

    fn mapping(&self) -> Arc<TagMap> {
        if let Some(mapping) = self.mapping.load_full() {
            return mapping;
        }
        let mapping = Arc::new(self.load());
        self.mapping.store(Some(Arc::clone(&mapping)));
        mapping
    }

    /// Read the first existing candidate; any failure yields an empty map
    fn load(&self) -> TagMap {
        let Some(path) = self.candidates.iter().find(|path| path.exists()) else {
            tracing::debug!("No tag collections file found");
            return TagMap::new();
        };

        match read_collections(path) {
            Ok(mapping) => {
                tracing::debug!("Loaded {} tag mappings from {:?}", mapping.len(), path);
                mapping
            }
            Err(e) => {
                tracing::warn!("Failed to load tag collections from {:?}: {}", path, e);
                TagMap::new()
            }
        }
    }
}

fn read_collections(path: &Path) -> Result<TagMap, TagCollectionError> {
    let content = fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    let document: MetaValue = match ext {
        "json" => serde_json::from_str::<serde_json::Value>(&content)?.into(),
        "toml" => toml::Value::Table(toml::from_str::<toml::Table>(&content)?).into(),
        _ => serde_yaml::from_str::<serde_yaml::Value>(&content)?.into(),
    };

    let entries: &[MetaValue] = match &document {
        MetaValue::Map(root) => match root.get("collections") {
            Some(MetaValue::Seq(entries)) => entries.as_slice(),
            None | Some(MetaValue::Null) => &[],
            Some(_) => {
                return Err(TagCollectionError::Format(
                    "`collections` is not a list".to_string(),
                ))
            }
        },
        MetaValue::Null => &[],
        _ => {
            return Err(TagCollectionError::Format(
                "top level is not a mapping".to_string(),
            ))
        }
    };

    let mut mapping = TagMap::new();
    for entry in entries {
        let MetaValue::Map(entry) = entry else {
            continue;
        };
        let text = |key: &str| match entry.get(key) {
            Some(MetaValue::Str(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        };

        let Some(name) = text("name") else {
            continue;
        };
        let slug = text("slug").unwrap_or_else(|| name.to_lowercase().replace(' ', "-"));
        let collection = Arc::new(TagCollection {
            slug,
            name,
            description: text("description"),
            color: text("color"),
        });

        for tag in crate::content::normalize_tags(entry.get("tags")) {
            mapping.insert(tag.to_lowercase(), Arc::clone(&collection));
        }
    }

    Ok(mapping)
}
