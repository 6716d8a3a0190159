//! Post builder - turns one markdown file into a `BlogPost`

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use super::frontmatter::slugify;
use super::{BlogPost, FrontMatter, MarkdownRenderer, ShortcodeExpander};
use crate::config::BlogConfig;
use crate::helpers::{excerpt_html, summarize, title_case};
use crate::i18n::Languages;
use crate::Blog;

/// Why a single document could not be loaded
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front-matter in {path:?}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("failed to render {path:?}: {message}")]
    Render { path: PathBuf, message: String },
}

/// Column assignment and daily marker derived from a file's location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub column: Option<String>,
    pub subcolumn: Option<String>,
    /// Some directory on the way is the daily dir
    pub under_daily: bool,
}

impl Placement {
    /// Derive placement from a path relative to the content root.
    ///
    /// One leading prefix segment (e.g. `posts`) is dropped; two remaining
    /// directories give `(column, subcolumn)`, one gives a column only, and
    /// anything else none. Files whose top directory is the daily dir never
    /// get a column.
    pub fn from_relative(relative: &Path, prefixes: &[String], daily_dir: &str) -> Self {
        let dirs: Vec<String> = relative
            .parent()
            .map(|parent| {
                parent
                    .components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => s.to_str().map(String::from),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let under_daily = dirs.iter().any(|d| d == daily_dir);

        let mut segments: &[String] = &dirs;
        if let Some(first) = segments.first() {
            if prefixes.contains(first) {
                segments = &segments[1..];
            }
        }

        let top_is_daily = dirs.first().is_some_and(|d| d == daily_dir)
            || segments.first().is_some_and(|d| d == daily_dir);
        if top_is_daily {
            return Self {
                under_daily,
                ..Self::default()
            };
        }

        let (column, subcolumn) = match segments {
            [column] => (Some(column.clone()), None),
            [column, subcolumn] => (Some(column.clone()), Some(subcolumn.clone())),
            _ => (None, None),
        };

        Self {
            column,
            subcolumn,
            under_daily,
        }
    }
}

/// Builds posts: front-matter, then shortcodes, then markdown
pub struct PostBuilder {
    content_root: PathBuf,
    column_prefixes: Vec<String>,
    daily_dir: String,
    summary_length: usize,
    excerpt_length: usize,
    languages: Languages,
    renderer: MarkdownRenderer,
    expander: ShortcodeExpander,
}

impl PostBuilder {
    /// Create a post builder for a blog
    pub fn new(blog: &Blog) -> Self {
        Self::with_config(&blog.base_dir, &blog.content_dir, &blog.config)
    }

    pub fn with_config(base_dir: &Path, content_root: &Path, config: &BlogConfig) -> Self {
        Self {
            content_root: content_root.to_path_buf(),
            column_prefixes: config.column_prefixes.clone(),
            daily_dir: config.daily_dir.clone(),
            summary_length: config.summary_length,
            excerpt_length: config.excerpt_length,
            languages: Languages::from_config(config),
            renderer: MarkdownRenderer::from_config(&config.highlight),
            expander: ShortcodeExpander::new(base_dir, content_root),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Build a post from a file.
    ///
    /// Drafts, unpublished and empty documents are skipped with `Ok(None)`.
    pub fn build(&self, path: &Path) -> Result<Option<BlogPost>, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (fm, body) = FrontMatter::parse(&content).map_err(|e| LoadError::FrontMatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if fm.is_draft() {
            tracing::debug!("Skipping draft: {:?}", path);
            return Ok(None);
        }

        let body = body.trim();
        if body.is_empty() {
            tracing::warn!("Skipping empty post: {:?}", path);
            return Ok(None);
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled");

        let title = fm.title().unwrap_or_else(|| title_case(stem));
        let slug = fm.slug().unwrap_or_else(|| slugify(stem));
        let date = fm.date().unwrap_or_else(|| file_modified(path));

        let relative = path.strip_prefix(&self.content_root).unwrap_or(path);
        let source = relative.to_string_lossy().replace('\\', "/");
        let placement = Placement::from_relative(relative, &self.column_prefixes, &self.daily_dir);

        // Shortcodes become placeholders, survive rendering, then get swapped back
        let expansion = self.expander.expand(body);
        let rendered = self
            .renderer
            .render(&expansion.text)
            .map_err(|e| LoadError::Render {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let content_html = expansion.inject(&rendered);

        let mut post = BlogPost::new(slug, title, date, source);
        post.summary = fm
            .summary()
            .unwrap_or_else(|| summarize(body, self.summary_length));
        post.excerpt = excerpt_html(&content_html, self.excerpt_length);
        post.content_html = content_html;
        post.content_raw = body.to_string();
        if let Some(group) = fm.group() {
            post.group_slug = Some(group.slug);
            post.group_label = group.label;
            post.group_description = group.description;
        }
        post.tags = fm.tags();
        post.is_daily = fm.is_daily() || placement.under_daily;
        post.lang = self.languages.normalize(fm.lang().as_deref());
        post.column = placement.column;
        post.subcolumn = placement.subcolumn;
        post.pinned = fm.pinned();
        post.full_source = path.to_path_buf();

        tracing::debug!("Loaded post '{}' from {}", post.slug, post.source);
        Ok(Some(post))
    }
}

/// Modification time of a file, or now if the platform cannot tell
fn file_modified(path: &Path) -> DateTime<Local> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Local>::from)
        .unwrap_or_else(|_| Local::now())
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Site {
        dir: TempDir,
        builder: PostBuilder,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let content = dir.path().join("content");
            fs::create_dir_all(&content).unwrap();
            let builder = PostBuilder::with_config(dir.path(), &content, &BlogConfig::default());
            Self { dir, builder }
        }

        fn write(&self, relative: &str, text: &str) -> PathBuf {
            let path = self.dir.path().join("content").join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, text).unwrap();
            path
        }

        fn build(&self, relative: &str, text: &str) -> Option<BlogPost> {
            let path = self.write(relative, text);
            self.builder.build(&path).unwrap()
        }
    }

    fn segments(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_placement() {
        let prefixes = segments(&["posts", "columns"]);
        let place = |p: &str| Placement::from_relative(Path::new(p), &prefixes, "daily");

        assert_eq!(place("hello.md"), Placement::default());
        let nested = place("columns/foo/bar/post.md");
        assert_eq!(nested.column.as_deref(), Some("foo"));
        assert_eq!(nested.subcolumn.as_deref(), Some("bar"));
        let single = place("posts/rust/intro.md");
        assert_eq!(single.column.as_deref(), Some("rust"));
        assert_eq!(single.subcolumn, None);
        assert_eq!(place("posts/hello.md").column, None);
        assert_eq!(place("a/b/c/deep.md").column, None);
        assert_eq!(place("travel/japan.md").column.as_deref(), Some("travel"));

        let daily = place("daily/foo/post.md");
        assert_eq!(daily.column, None);
        assert!(daily.under_daily);
        let prefixed_daily = place("posts/daily/note.md");
        assert_eq!(prefixed_daily.column, None);
        assert!(prefixed_daily.under_daily);
    }

    #[test]
    fn test_build_full_post() {
        let site = Site::new();
        let post = site
            .build(
                "columns/rust/async/Futures Explained.md",
                r#"---
title: Futures Explained
date: 2024-05-01
tags: [Rust, async]
group:
  name: Deep Dives
  description: Long reads
lang: zh-CN
pinned: true
---

First paragraph.

Second paragraph.
"#,
            )
            .unwrap();

        assert_eq!(post.slug, "futures-explained");
        assert_eq!(post.title, "Futures Explained");
        assert_eq!(post.date.format("%Y-%m-%d").to_string(), "2024-05-01");
        assert_eq!(post.tags, vec!["Rust", "async"]);
        assert_eq!(post.group_slug.as_deref(), Some("deep-dives"));
        assert_eq!(post.group_label.as_deref(), Some("Deep Dives"));
        assert_eq!(post.group_description.as_deref(), Some("Long reads"));
        assert_eq!(post.lang, "zh");
        assert_eq!(post.column.as_deref(), Some("rust"));
        assert_eq!(post.subcolumn.as_deref(), Some("async"));
        assert!(post.pinned);
        assert!(!post.is_daily);
        assert_eq!(post.summary, "First paragraph. Second paragraph.");
        assert_eq!(post.excerpt, "<p>First paragraph.</p>");
        assert_eq!(post.content_raw, "First paragraph.\n\nSecond paragraph.");
        assert_eq!(post.source, "columns/rust/async/Futures Explained.md");
    }

    #[test]
    fn test_defaults_from_filename() {
        let site = Site::new();
        let post = site.build("my_first-post.md", "Just text.").unwrap();
        assert_eq!(post.slug, "my-first-post");
        assert_eq!(post.title, "My First Post");
        assert_eq!(post.lang, "en");
        assert!(post.tags.is_empty());
        assert_eq!(post.group_slug, None);

        let mtime: DateTime<Local> = fs::metadata(&post.full_source)
            .unwrap()
            .modified()
            .unwrap()
            .into();
        assert_eq!(post.date, mtime);
    }

    #[test]
    fn test_explicit_slug_and_summary() {
        let site = Site::new();
        let post = site
            .build(
                "x.md",
                "---\nslug: Custom_Slug\nsummary: \"  Short.  \"\n---\nBody text",
            )
            .unwrap();
        assert_eq!(post.slug, "Custom_Slug");
        assert_eq!(post.summary, "Short.");
    }

    #[test]
    fn test_skips_drafts_and_empty_posts() {
        let site = Site::new();
        assert!(site.build("draft.md", "---\ndraft: true\n---\nBody").is_none());
        assert!(site
            .build("hidden.md", "---\npublished: false\n---\nBody")
            .is_none());
        assert!(site.build("empty.md", "---\ntitle: Empty\n---\n   \n\n").is_none());
    }

    #[test]
    fn test_invalid_frontmatter_is_an_error() {
        let site = Site::new();
        let path = site.write("broken.md", "---\ntitle: [oops\n---\nBody");
        let err = site.builder.build(&path).unwrap_err();
        assert!(matches!(err, LoadError::FrontMatter { .. }));
    }

    #[test]
    fn test_daily_by_path_and_by_metadata() {
        let site = Site::new();
        let by_path = site.build("daily/foo/post.md", "Today.").unwrap();
        assert!(by_path.is_daily);
        assert_eq!(by_path.column, None);

        let by_type = site.build("note.md", "---\ntype: daily\n---\nToday.").unwrap();
        assert!(by_type.is_daily);
    }

    #[test]
    fn test_long_body_summary_is_truncated() {
        let site = Site::new();
        let body = "lorem ipsum ".repeat(40);
        let post = site.build("long.md", &body).unwrap();
        assert!(post.summary.ends_with("..."));
        assert!(post.summary.chars().count() <= 163);
    }

    #[test]
    fn test_shortcodes_survive_rendering() {
        let site = Site::new();
        site.write("snippets/demo.py", "a = 1\nb = 2\nc = 3\n");
        let post = site
            .build(
                "post.md",
                "Intro with @[Preview](https://example.org/docs) inline.\n\n@content/snippets/demo.py:2-2\n\n| a |\n|---|\n| b |\n",
            )
            .unwrap();

        assert!(!post.content_html.contains("mdpress-shortcode"));
        assert!(post.content_html.contains(r#"<span class="link-preview-domain">example.org</span>"#));
        assert!(post
            .content_html
            .contains(r#"<pre><code class="language-py">b = 2</code></pre>"#));
        assert!(post.content_html.contains("<table>"));
        assert!(post.content_raw.contains("@content/snippets/demo.py:2-2"));
    }

    #[test]
    fn test_shortcodes_in_code_are_left_as_written() {
        let site = Site::new();
        site.write("x.md", "only line\n");
        let post = site
            .build(
                "howto.md",
                "Use `@[Preview](https://a.dev/x)` like this.\n\n```\n@content/x.md:1-1\n```\n\nThen @content/x.md:1-1 embeds it.\n",
            )
            .unwrap();

        assert!(!post.content_html.contains("mdpress-shortcode"));
        assert!(post
            .content_html
            .contains("<code>@[Preview](https://a.dev/x)</code>"));
        assert!(!post.content_html.contains("link-preview"));
        assert_eq!(post.content_html.matches(r#"class="file-preview""#).count(), 1);
    }

    #[test]
    fn test_extensionless_file_preview_is_plain_text() {
        let site = Site::new();
        site.write("Makefile", "all:\n\tcargo build\n");
        let post = site.build("build.md", "See\n\n@content/Makefile\n").unwrap();

        assert!(post.content_html.contains(r#"<code class="language-text">"#));
        assert!(post
            .content_html
            .contains(r#"<div class="file-preview-header">content/Makefile</div>"#));
        assert!(!post.content_html.contains("mdpress-shortcode"));
    }

    #[test]
    fn test_is_markdown_file() {
        assert!(is_markdown_file(Path::new("a.md")));
        assert!(is_markdown_file(Path::new("a.MARKDOWN")));
        assert!(!is_markdown_file(Path::new("a.txt")));
        assert!(!is_markdown_file(Path::new("README")));
    }
}
