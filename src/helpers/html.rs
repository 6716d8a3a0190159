//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Take the first rendered paragraph as the excerpt.
///
/// Falls back to the first `limit` characters (plus `...` when cut) if the
/// HTML contains no closing `</p>`.
///
/// # Examples
/// ```ignore
/// excerpt_html("<h1>T</h1><p>One</p><p>Two</p>", 280) // -> "<h1>T</h1><p>One</p>"
/// ```
pub fn excerpt_html(html: &str, limit: usize) -> String {
    const CLOSE: &str = "</p>";
    if let Some(pos) = html.find(CLOSE) {
        return html[..pos + CLOSE.len()].to_string();
    }

    let snippet: String = html.chars().take(limit).collect();
    if html.chars().count() > limit {
        format!("{}...", snippet)
    } else {
        snippet
    }
}
