//! Shortcode expansion
//!
//! Two inline directives are recognised in the raw markdown body:
//!
//! - `@[Preview](https://example.com/page)` renders a static link card.
//! - `@content/path/file.rs:10-20` embeds lines of a file from the content
//!   root (the range is optional).
//!
//! Expansion runs in two passes. [`ShortcodeExpander::expand`] swaps every
//! shortcode for an HTML comment placeholder before markdown rendering, and
//! [`Expansion::inject`] puts the pre-built HTML back into the rendered
//! output. Placeholders carry a random per-document token so they cannot
//! collide with comments written by hand.

use lazy_static::lazy_static;
use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};
use std::fs;
use std::ops::Range;
use std::path::{Component, Path, PathBuf};

use super::markdown::parser_options;
use crate::helpers::html_escape;

lazy_static! {
    static ref REMOTE_PREVIEW: Regex = Regex::new(r"@\[Preview\]\((https?://[^\s()]+)\)").unwrap();
    // A path with a directory may end in any name (`content/Makefile`); a bare
    // file name needs an extension.
    static ref FILE_PREVIEW: Regex = Regex::new(
        r"(?m)(^|[\s(])@((?:[\w.-]+/)+[\w.-]*\w|[\w.-]+\.[A-Za-z0-9]+)(?::(\d+)-(\d+))?"
    )
    .unwrap();
}

/// Result of the first pass: rewritten markdown plus the HTML each
/// placeholder stands for, in creation order.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub text: String,
    placeholders: Vec<(String, String)>,
}

impl Expansion {
    pub fn placeholders(&self) -> &[(String, String)] {
        &self.placeholders
    }

    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }

    /// Second pass: replace each placeholder in rendered HTML with its fragment
    pub fn inject(&self, html: &str) -> String {
        let mut output = html.to_string();
        for (token, fragment) in &self.placeholders {
            output = output.replace(token.as_str(), fragment);
        }
        output
    }
}

/// Where a file shortcode points
enum Target {
    Found(PathBuf),
    Missing,
    Rejected(&'static str),
}

/// Expands shortcodes against one content root
#[derive(Debug, Clone)]
pub struct ShortcodeExpander {
    /// Shortcode paths are relative to this directory
    base_dir: PathBuf,
    /// Every embedded file must live below this directory
    content_root: PathBuf,
}

impl ShortcodeExpander {
    pub fn new(base_dir: impl Into<PathBuf>, content_root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            content_root: content_root.into(),
        }
    }

    /// First pass: remote previews, then file previews.
    ///
    /// Shortcodes inside code spans and code blocks are left as written.
    pub fn expand(&self, body: &str) -> Expansion {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let mut placeholders: Vec<(String, String)> = Vec::new();

        let mut push = |fragment: String| -> String {
            let token = format!("<!--mdpress-shortcode:{}:{}-->", nonce, placeholders.len());
            placeholders.push((token.clone(), fragment));
            token
        };

        let code = code_ranges(body);
        let text = REMOTE_PREVIEW.replace_all(body, |caps: &Captures| {
            if in_ranges(&code, caps.get(0).map_or(0, |m| m.start())) {
                return caps[0].to_string();
            }
            push(remote_card(&caps[1]))
        });

        // Offsets moved, so code is located again in the rewritten text
        let code = code_ranges(&text);
        let text = FILE_PREVIEW.replace_all(&text, |caps: &Captures| {
            if in_ranges(&code, caps.get(2).map_or(0, |m| m.start())) {
                return caps[0].to_string();
            }
            let prefix = &caps[1];
            let path = &caps[2];
            let range = match (caps.get(3), caps.get(4)) {
                (Some(start), Some(end)) => Some((
                    start.as_str().parse::<usize>().unwrap_or(usize::MAX),
                    end.as_str().parse::<usize>().unwrap_or(usize::MAX),
                )),
                _ => None,
            };
            match self.file_block(path, range) {
                Some(fragment) => format!("{}{}", prefix, push(fragment)),
                None => caps[0].to_string(),
            }
        });

        Expansion {
            text: text.into_owned(),
            placeholders,
        }
    }

    fn resolve(&self, relative: &str) -> Target {
        let rel = Path::new(relative);
        let escapes = rel.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Target::Rejected("path leaves the content root");
        }

        let joined = self.base_dir.join(rel);
        if !joined.starts_with(&self.content_root) {
            return Target::Rejected("path is outside the content root");
        }
        if !joined.is_file() {
            return Target::Missing;
        }

        // Symlinks can still point elsewhere
        match (joined.canonicalize(), self.content_root.canonicalize()) {
            (Ok(file), Ok(root)) if file.starts_with(&root) => Target::Found(file),
            (Ok(_), Ok(_)) => Target::Rejected("path resolves outside the content root"),
            _ => Target::Missing,
        }
    }

    fn file_block(&self, relative: &str, range: Option<(usize, usize)>) -> Option<String> {
        let path = match self.resolve(relative) {
            Target::Found(path) => path,
            Target::Missing => {
                tracing::debug!("File preview target not found: {}", relative);
                return None;
            }
            Target::Rejected(reason) => {
                tracing::warn!("Rejected file preview '{}': {}", relative, reason);
                return None;
            }
        };

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Failed to read file preview {:?}: {}", path, e);
                return None;
            }
        };

        let (header, code) = match range {
            Some((start, end)) => {
                let lines: Vec<&str> = source.lines().collect();
                let from = start.saturating_sub(1).min(lines.len());
                let to = end.min(lines.len());
                let code = if from < to {
                    lines[from..to].join("\n")
                } else {
                    String::new()
                };
                (format!("{}:{}-{}", relative, start, end), code)
            }
            None => (relative.to_string(), source.trim_end_matches('\n').to_string()),
        };

        let lang = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("text");

        Some(format!(
            concat!(
                r#"<div class="file-preview">"#,
                r#"<div class="file-preview-header">{}</div>"#,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                "</div>"
            ),
            html_escape(&header),
            html_escape(lang),
            html_escape(&code)
        ))
    }
}

/// Byte ranges of inline code spans and code blocks in a markdown body
fn code_ranges(markdown: &str) -> Vec<Range<usize>> {
    Parser::new_ext(markdown, parser_options())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Code(_) | Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

fn in_ranges(ranges: &[Range<usize>], offset: usize) -> bool {
    ranges.iter().any(|range| range.contains(&offset))
}

/// Offline link card; the host is the third `/`-separated piece of the URL
fn remote_card(url: &str) -> String {
    let domain = url.split('/').nth(2).unwrap_or(url);
    let url = html_escape(url);
    format!(
        concat!(
            r#"<div class="link-preview">"#,
            r#"<a class="link-preview-card" href="{url}" target="_blank" rel="noopener noreferrer">"#,
            r#"<span class="link-preview-domain">{domain}</span>"#,
            r#"<span class="link-preview-url">{url}</span>"#,
            "</a></div>"
        ),
        url = url,
        domain = html_escape(domain)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ShortcodeExpander) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("code")).unwrap();
        fs::write(content.join("x.md"), "one\ntwo\nthree\nfour\nfive\n").unwrap();
        fs::write(content.join("code/main.rs"), "fn main() {\n    println!(\"<hi>\");\n}\n").unwrap();
        fs::write(dir.path().join("secret.txt"), "top secret\n").unwrap();
        let expander = ShortcodeExpander::new(dir.path(), &content);
        (dir, expander)
    }

    #[test]
    fn test_file_preview_line_range() {
        let (_dir, expander) = setup();
        let expansion = expander.expand("See @content/x.md:2-3 here");
        assert_eq!(expansion.placeholders().len(), 1);
        assert!(!expansion.text.contains("@content"));
        assert!(expansion.text.starts_with("See <!--mdpress-shortcode:"));

        let html = &expansion.placeholders()[0].1;
        assert!(html.contains(r#"<code class="language-md">two
three</code>"#));
        assert!(html.contains("content/x.md:2-3"));
        assert!(!html.contains("one"));
        assert!(!html.contains("four"));
    }

    #[test]
    fn test_file_preview_range_is_clamped() {
        let (_dir, expander) = setup();
        let expansion = expander.expand("@content/x.md:1-999");
        let html = &expansion.placeholders()[0].1;
        assert!(html.contains("one\ntwo\nthree\nfour\nfive</code>"));
        assert!(html.contains("content/x.md:1-999"));
    }

    #[test]
    fn test_file_preview_whole_file_escaped() {
        let (_dir, expander) = setup();
        let expansion = expander.expand("Code:\n\n@content/code/main.rs\n");
        let html = &expansion.placeholders()[0].1;
        assert!(html.contains(r#"class="language-rs""#));
        assert!(html.contains("&lt;hi&gt;"));
        assert!(html.contains(r#"<div class="file-preview-header">content/code/main.rs</div>"#));
    }

    #[test]
    fn test_missing_file_left_verbatim() {
        let (_dir, expander) = setup();
        let body = "Look at @content/nope.md:1-2 please";
        let expansion = expander.expand(body);
        assert!(expansion.is_empty());
        assert_eq!(expansion.text, body);
    }

    #[test]
    fn test_traversal_is_rejected() {
        let (_dir, expander) = setup();
        for body in ["@content/../secret.txt", "@secret.txt", "(@../secret.txt)"] {
            let expansion = expander.expand(body);
            assert!(expansion.is_empty(), "{}", body);
            assert_eq!(expansion.text, body);
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_out_of_root_is_rejected() {
        let (dir, expander) = setup();
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            dir.path().join("content/leak.txt"),
        )
        .unwrap();

        let body = "See @content/leak.txt here";
        let expansion = expander.expand(body);
        assert!(expansion.is_empty());
        assert_eq!(expansion.text, body);
    }

    #[test]
    fn test_code_spans_and_blocks_are_skipped() {
        let (_dir, expander) = setup();
        let body = "`@[Preview](https://a.dev)` and\n\n```\n@content/x.md:1-1\n```\n";
        let expansion = expander.expand(body);
        assert!(expansion.is_empty());
        assert_eq!(expansion.text, body);

        let mixed = expander.expand("`@content/x.md` vs @content/x.md:2-2");
        assert_eq!(mixed.placeholders().len(), 1);
        assert!(mixed.text.starts_with("`@content/x.md` vs <!--mdpress-shortcode:"));
    }

    #[test]
    fn test_extensionless_path_defaults_to_text() {
        let (dir, expander) = setup();
        fs::write(dir.path().join("content/Makefile"), "all:\n\tcargo build\n").unwrap();

        let expansion = expander.expand("@content/Makefile");
        assert_eq!(expansion.placeholders().len(), 1);
        let html = &expansion.placeholders()[0].1;
        assert!(html.contains(r#"<code class="language-text">all:"#));

        let sentence = expander.expand("Read @content/x.md.");
        assert_eq!(sentence.placeholders().len(), 1);
        assert!(sentence.text.ends_with("-->."));
    }

    #[test]
    fn test_email_is_not_a_shortcode() {
        let (_dir, expander) = setup();
        let body = "mail me@content/x.md";
        assert!(expander.expand(body).is_empty());
    }

    #[test]
    fn test_remote_preview() {
        let (_dir, expander) = setup();
        let expansion = expander.expand("@[Preview](https://example.com/a?b=1&c=2)");
        assert_eq!(expansion.placeholders().len(), 1);
        let html = &expansion.placeholders()[0].1;
        assert!(html.contains(r#"<span class="link-preview-domain">example.com</span>"#));
        assert!(html.contains("https://example.com/a?b=1&amp;c=2"));
    }

    #[test]
    fn test_remote_preview_requires_scheme() {
        let (_dir, expander) = setup();
        let body = "@[Preview](example.com/page)";
        let expansion = expander.expand(body);
        assert!(expansion.is_empty());
        assert_eq!(expansion.text, body);
    }

    #[test]
    fn test_placeholders_are_sequential_and_injected() {
        let (_dir, expander) = setup();
        let expansion = expander.expand("@[Preview](https://a.dev/x)\n\n@content/x.md:5-5\n");
        let tokens: Vec<&str> = expansion
            .placeholders()
            .iter()
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].ends_with(":0-->"));
        assert!(tokens[1].ends_with(":1-->"));

        let rendered = format!("<p>{}</p>\n{}\n", tokens[0], tokens[1]);
        let html = expansion.inject(&rendered);
        assert!(!html.contains("mdpress-shortcode"));
        assert!(html.contains("a.dev"));
        assert!(html.contains(">five</code>"));
    }

    #[test]
    fn test_tokens_differ_between_expansions() {
        let (_dir, expander) = setup();
        let a = expander.expand("@[Preview](https://a.dev)");
        let b = expander.expand("@[Preview](https://a.dev)");
        assert_ne!(a.placeholders()[0].0, b.placeholders()[0].0);
    }
}
