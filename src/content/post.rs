//! Post and group models

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    /// Unique key within one index build
    pub slug: String,

    /// Post title
    pub title: String,

    /// Explicit summary or a plain-text excerpt of the body
    pub summary: String,

    /// Rendered HTML with shortcodes expanded
    pub content_html: String,

    /// Trimmed markdown body
    pub content_raw: String,

    /// First rendered paragraph
    pub excerpt: String,

    /// Publication date
    pub date: DateTime<Local>,

    pub group_slug: Option<String>,
    pub group_label: Option<String>,
    pub group_description: Option<String>,

    /// Post tags, in front-matter order
    pub tags: Vec<String>,

    pub is_daily: bool,

    /// Two-letter language code
    pub lang: String,

    /// Top-level column, from the directory layout
    pub column: Option<String>,
    pub subcolumn: Option<String>,

    pub pinned: bool,

    /// Source file path relative to the content root
    pub source: String,

    /// Full source file path
    pub full_source: PathBuf,
}

impl BlogPost {
    /// Create a new post with minimal required fields
    pub fn new(slug: String, title: String, date: DateTime<Local>, source: String) -> Self {
        Self {
            slug,
            title,
            summary: String::new(),
            content_html: String::new(),
            content_raw: String::new(),
            excerpt: String::new(),
            date,
            group_slug: None,
            group_label: None,
            group_description: None,
            tags: Vec::new(),
            is_daily: false,
            lang: "en".to_string(),
            column: None,
            subcolumn: None,
            pinned: false,
            source: source.clone(),
            full_source: PathBuf::from(&source),
        }
    }

    /// Date as shown in listings, e.g. `Jan 05, 2025`
    pub fn display_date(&self) -> String {
        self.date.format("%b %d, %Y").to_string()
    }

    /// Case-insensitive tag membership
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        !wanted.is_empty() && self.tags.iter().any(|t| t.to_lowercase() == wanted)
    }
}

/// Posts sharing one `group_slug`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupSummary {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub post_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_date() {
        let date = Local.with_ymd_and_hms(2025, 1, 5, 10, 30, 0).unwrap();
        let post = BlogPost::new("a".into(), "A".into(), date, "a.md".into());
        assert_eq!(post.display_date(), "Jan 05, 2025");
        assert_eq!(post.lang, "en");
    }

    #[test]
    fn test_has_tag() {
        let date = Local.with_ymd_and_hms(2025, 1, 5, 10, 30, 0).unwrap();
        let mut post = BlogPost::new("a".into(), "A".into(), date, "a.md".into());
        post.tags = vec!["Rust".into(), "Web Dev".into()];
        assert!(post.has_tag("rust"));
        assert!(post.has_tag(" web dev "));
        assert!(!post.has_tag("web"));
        assert!(!post.has_tag(""));
    }
}
