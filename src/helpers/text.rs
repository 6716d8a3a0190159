//! Plain-text helpers for titles and summaries

/// Collapse every run of whitespace into a single space
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a plain-text summary of at most `length` characters.
///
/// Text longer than the limit is cut, trailing whitespace removed and `...`
/// appended.
pub fn summarize(content: &str, length: usize) -> String {
    let plain = collapse_whitespace(content);
    if plain.chars().count() <= length {
        return plain;
    }
    let cut: String = plain.chars().take(length).collect();
    format!("{}...", cut.trim_end())
}

/// Turn a word list separated by `-`, `_` or spaces into title case
///
/// # Examples
/// ```ignore
/// title_case("hello-rust_world") // -> "Hello Rust World"
/// ```
pub fn title_case(s: &str) -> String {
    s.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
