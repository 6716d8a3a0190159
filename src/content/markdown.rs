//! Markdown rendering with syntax highlighting

use anyhow::Result;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::config::HighlightConfig;
use crate::helpers::html_escape;

/// Extensions enabled for every parse of a post body
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::from_config(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn from_config(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_number,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String> {
        // Raw HTML passes through untouched, which shortcode placeholders rely on.
        // Front-matter is stripped before this point, so no metadata blocks.
        let parser = Parser::new_ext(markdown, parser_options());

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            // Info strings like "rust,ignore" or "rust title" carry extras
                            let lang = lang
                                .split(|c: char| c == ',' || c.is_whitespace())
                                .next()
                                .unwrap_or_default()
                                .to_string();
                            if lang.is_empty() {
                                None
                            } else {
                                Some(lang)
                            }
                        }
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let block = self.highlight_code(&code_block_content, code_block_lang.as_deref());
                    events.push(Event::Html(CowStr::from(block)));
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        let plain = || {
            format!(
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                html_escape(lang),
                html_escape(code)
            )
        };

        if !self.highlight {
            return plain();
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
        else {
            return plain();
        };

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) if self.line_numbers => self.add_line_numbers(&highlighted, lang),
            Ok(highlighted) => format!(
                r#"<figure class="highlight {}">{}</figure>"#,
                html_escape(lang),
                highlighted
            ),
            Err(e) => {
                tracing::debug!("Highlighting failed for {}: {}", lang, e);
                plain()
            }
        }
    }

    /// Add line numbers to highlighted code
    fn add_line_numbers(&self, code: &str, lang: &str) -> String {
        let lines: Vec<&str> = code.lines().collect();

        let gutter = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre>{}</pre></td></tr></table></figure>"#,
            html_escape(lang),
            gutter,
            lines.join("\n")
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
