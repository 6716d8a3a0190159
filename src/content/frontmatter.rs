//! Front-matter parsing

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// A front-matter value, independent of the block format it came from
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Native date-time (TOML only)
    DateTime(DateTime<Local>),
    /// Native date without time (TOML only)
    Date(NaiveDate),
    Seq(Vec<MetaValue>),
    Map(IndexMap<String, MetaValue>),
}

impl MetaValue {
    /// Scalar rendered as text; `None` for null and containers
    pub fn as_text(&self) -> Option<String> {
        match self {
            MetaValue::Str(s) => Some(s.clone()),
            MetaValue::Int(i) => Some(i.to_string()),
            MetaValue::Float(f) => Some(f.to_string()),
            MetaValue::Bool(b) => Some(b.to_string()),
            MetaValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            MetaValue::DateTime(dt) => Some(dt.to_rfc3339()),
            MetaValue::Null | MetaValue::Seq(_) | MetaValue::Map(_) => None,
        }
    }

    /// Trimmed text, dropping empty values
    fn as_trimmed_text(&self) -> Option<String> {
        self.as_text()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Loose boolean reading: `yes`, `1`, non-empty lists and so on count as true
    pub fn is_truthy(&self) -> bool {
        match self {
            MetaValue::Null => false,
            MetaValue::Bool(b) => *b,
            MetaValue::Int(i) => *i != 0,
            MetaValue::Float(f) => *f != 0.0,
            MetaValue::Str(s) => !matches!(
                s.trim().to_lowercase().as_str(),
                "" | "false" | "no" | "off" | "0"
            ),
            MetaValue::DateTime(_) | MetaValue::Date(_) => true,
            MetaValue::Seq(items) => !items.is_empty(),
            MetaValue::Map(map) => !map.is_empty(),
        }
    }
}

impl From<serde_yaml::Value> for MetaValue {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => MetaValue::Null,
            Value::Bool(b) => MetaValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => MetaValue::Int(i),
                None => MetaValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => MetaValue::Str(s),
            Value::Sequence(items) => MetaValue::Seq(items.into_iter().map(Into::into).collect()),
            Value::Mapping(map) => MetaValue::Map(
                map.into_iter()
                    .filter_map(|(k, v)| {
                        let key = MetaValue::from(k).as_text()?;
                        Some((key, MetaValue::from(v)))
                    })
                    .collect(),
            ),
            Value::Tagged(tagged) => MetaValue::from(tagged.value),
        }
    }
}

impl From<serde_json::Value> for MetaValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => MetaValue::Null,
            Value::Bool(b) => MetaValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => MetaValue::Int(i),
                None => MetaValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => MetaValue::Str(s),
            Value::Array(items) => MetaValue::Seq(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                MetaValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<toml::Value> for MetaValue {
    fn from(value: toml::Value) -> Self {
        use toml::Value;
        match value {
            Value::String(s) => MetaValue::Str(s),
            Value::Integer(i) => MetaValue::Int(i),
            Value::Float(f) => MetaValue::Float(f),
            Value::Boolean(b) => MetaValue::Bool(b),
            Value::Datetime(dt) => from_toml_datetime(&dt),
            Value::Array(items) => MetaValue::Seq(items.into_iter().map(Into::into).collect()),
            Value::Table(table) => {
                MetaValue::Map(table.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

fn from_toml_datetime(dt: &toml::value::Datetime) -> MetaValue {
    let text = dt.to_string();
    let parsed = match (dt.date.is_some(), dt.time.is_some(), dt.offset.is_some()) {
        (true, false, _) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .ok()
            .map(MetaValue::Date),
        (true, true, true) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|dt| MetaValue::DateTime(dt.with_timezone(&Local))),
        (true, true, false) => NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| MetaValue::DateTime(local_from_naive(naive))),
        _ => None,
    };
    parsed.unwrap_or(MetaValue::Str(text))
}

/// Grouping metadata resolved from the `group` field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupMeta {
    pub slug: String,
    pub label: Option<String>,
    pub description: Option<String>,
}

/// Front-matter data from a post
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    fields: IndexMap<String, MetaValue>,
}

impl FrontMatter {
    pub fn from_fields(fields: IndexMap<String, MetaValue>) -> Self {
        Self { fields }
    }

    /// Raw access to a field
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key).filter(|v| !matches!(v, MetaValue::Null))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        // YAML front-matter (---)
        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        // TOML front-matter (+++)
        if content.starts_with("+++") {
            return Self::parse_toml(content);
        }

        // JSON front-matter (;;; or {"key":)
        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str)> {
        let rest = &content[3..];
        let rest = rest.trim_start_matches(['\n', '\r']);

        // `---` immediately followed by `---`: an empty block
        if let Some(after) = rest.strip_prefix("---") {
            return Ok((FrontMatter::default(), after.trim_start_matches(['\n', '\r'])));
        }

        let Some(end_pos) = rest.find("\n---") else {
            return Ok((FrontMatter::default(), content));
        };

        let yaml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // A `---` thematic break followed by prose is body text, not metadata
        if !looks_like_yaml(yaml_content) {
            return Ok((FrontMatter::default(), content));
        }

        let value: serde_yaml::Value = serde_yaml::from_str(yaml_content)
            .map_err(|e| anyhow!("Failed to parse YAML front-matter: {}", e))?;
        Ok((Self::from_value(value.into())?, remaining))
    }

    fn parse_toml(content: &str) -> Result<(Self, &str)> {
        let rest = content[3..].trim_start_matches(['\n', '\r']);
        if let Some(after) = rest.strip_prefix("+++") {
            return Ok((FrontMatter::default(), after.trim_start_matches(['\n', '\r'])));
        }

        let Some(end_pos) = rest.find("\n+++") else {
            return Err(anyhow!("Unterminated TOML front-matter"));
        };

        let toml_content = &rest[..end_pos];
        let remaining = rest[end_pos + 4..].trim_start_matches(['\n', '\r']);

        let table: toml::Table = toml::from_str(toml_content)
            .map_err(|e| anyhow!("Failed to parse TOML front-matter: {}", e))?;
        let fm = Self::from_value(toml::Value::Table(table).into())?;
        Ok((fm, remaining))
    }

    fn parse_json(content: &str) -> Result<(Self, &str)> {
        // JSON front-matter ends with ;;;
        if let Some(rest) = content.strip_prefix(";;;") {
            let Some(end_pos) = rest.find(";;;") else {
                return Err(anyhow!("Unterminated JSON front-matter"));
            };
            let json_content = rest[..end_pos].trim();
            let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);

            // braces may be omitted inside ;;; blocks
            let json_content = if json_content.starts_with('{') {
                json_content.to_string()
            } else {
                format!("{{{}}}", json_content)
            };
            let value: serde_json::Value = serde_json::from_str(&json_content)
                .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;
            return Ok((Self::from_value(value.into())?, remaining));
        }

        // Leading JSON object; anything that fails to parse is plain body text
        let mut depth = 0;
        let mut end_pos = 0;
        for (i, c) in content.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end_pos = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }

        if end_pos > 0 {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&content[..end_pos]) {
                let remaining = content[end_pos..].trim_start_matches(['\n', '\r']);
                return Ok((Self::from_value(value.into())?, remaining));
            }
        }

        Ok((FrontMatter::default(), content))
    }

    fn from_value(value: MetaValue) -> Result<Self> {
        match value {
            MetaValue::Map(fields) => Ok(Self { fields }),
            MetaValue::Null => Ok(Self::default()),
            other => Err(anyhow!("Front-matter is not a mapping: {:?}", other)),
        }
    }

    /// `draft: true` or `published: false`
    pub fn is_draft(&self) -> bool {
        let draft = self.get("draft").is_some_and(MetaValue::is_truthy);
        let unpublished = self.get("published").is_some_and(|v| !v.is_truthy());
        draft || unpublished
    }

    pub fn title(&self) -> Option<String> {
        self.get("title").and_then(MetaValue::as_trimmed_text)
    }

    /// Explicit slug, used verbatim
    pub fn slug(&self) -> Option<String> {
        self.get("slug").and_then(MetaValue::as_trimmed_text)
    }

    /// Explicit `summary`, falling back to `description`
    pub fn summary(&self) -> Option<String> {
        ["summary", "description"]
            .iter()
            .filter_map(|key| self.get(key))
            .find_map(|v| match v {
                MetaValue::Str(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
    }

    /// Resolve the `date` field; `None` means "use the file's mtime"
    pub fn date(&self) -> Option<DateTime<Local>> {
        self.get("date").and_then(resolve_date)
    }

    pub fn group(&self) -> Option<GroupMeta> {
        match self.get("group")? {
            // An empty label still groups, under the `post` fallback slug
            MetaValue::Str(label) => {
                let label = label.trim();
                Some(GroupMeta {
                    slug: slugify(label),
                    label: Some(label.to_string()).filter(|l| !l.is_empty()),
                    description: None,
                })
            }
            MetaValue::Map(map) => {
                let field = |key: &str| map.get(key).and_then(MetaValue::as_trimmed_text);
                let label = field("name").or_else(|| field("label"));
                let slug = field("slug")
                    .unwrap_or_else(|| slugify(label.as_deref().unwrap_or_default()));
                let description = match map.get("description") {
                    Some(MetaValue::Str(s)) => Some(s.trim().to_string()),
                    _ => None,
                };
                Some(GroupMeta {
                    slug,
                    label,
                    description,
                })
            }
            _ => None,
        }
    }

    /// Tags in front-matter order
    pub fn tags(&self) -> Vec<String> {
        normalize_tags(self.get("tags"))
    }

    /// `daily: true` or `type: daily`
    pub fn is_daily(&self) -> bool {
        let flagged = self.get("daily").is_some_and(MetaValue::is_truthy);
        let typed = matches!(self.get("type"), Some(MetaValue::Str(t)) if t.trim() == "daily");
        flagged || typed
    }

    /// Raw `lang`/`language` value, before normalization
    pub fn lang(&self) -> Option<String> {
        self.get("lang")
            .or_else(|| self.get("language"))
            .and_then(MetaValue::as_trimmed_text)
    }

    pub fn pinned(&self) -> bool {
        self.get("pinned")
            .or_else(|| self.get("pin"))
            .is_some_and(MetaValue::is_truthy)
    }
}

/// Normalize a `tags` value: a single string or a list of strings
pub fn normalize_tags(value: Option<&MetaValue>) -> Vec<String> {
    match value {
        Some(MetaValue::Str(tag)) => {
            let tag = tag.trim();
            if tag.is_empty() {
                Vec::new()
            } else {
                vec![tag.to_string()]
            }
        }
        Some(MetaValue::Seq(items)) => items
            .iter()
            .filter_map(|item| match item {
                MetaValue::Str(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Derive a URL-safe slug: lowercase, runs of non `[a-z0-9]` become one
/// hyphen, no leading/trailing hyphens, `post` if nothing is left.
pub fn slugify(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let replaced = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = replaced.trim_matches('-');
    if slug.is_empty() {
        "post".to_string()
    } else {
        slug.to_string()
    }
}

/// Interpret a naive date-time in the local timezone
pub fn local_from_naive(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// String formats tried in order, before the generic ISO-8601 fallback
enum DateFormat {
    /// Date only, midnight local time
    Date(&'static str),
    /// Date and time, local time
    Naive(&'static str),
    /// Date and time with an explicit offset
    Offset(&'static str),
}

const DATE_FORMATS: &[DateFormat] = &[
    DateFormat::Date("%Y-%m-%d"),
    DateFormat::Date("%Y/%m/%d"),
    DateFormat::Naive("%Y-%m-%d %H:%M"),
    DateFormat::Naive("%Y-%m-%dT%H:%M:%S"),
    DateFormat::Offset("%Y-%m-%dT%H:%M:%S%z"),
];

const ISO_NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Resolve a front-matter date value.
///
/// Native date-time, then native date (midnight), then epoch seconds, then
/// the string formats. Unparseable strings are logged and treated as absent.
pub fn resolve_date(value: &MetaValue) -> Option<DateTime<Local>> {
    match value {
        MetaValue::DateTime(dt) => Some(*dt),
        MetaValue::Date(d) => d.and_hms_opt(0, 0, 0).map(local_from_naive),
        MetaValue::Int(secs) => Local.timestamp_opt(*secs, 0).single(),
        MetaValue::Float(secs) => {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
            Local.timestamp_opt(whole as i64, nanos).single()
        }
        MetaValue::Str(s) => parse_date_string(s),
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let text = s.trim();
    if text.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        let parsed = match format {
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(text, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(local_from_naive),
            DateFormat::Naive(fmt) => NaiveDateTime::parse_from_str(text, fmt)
                .ok()
                .map(local_from_naive),
            DateFormat::Offset(fmt) => DateTime::<FixedOffset>::parse_from_str(text, fmt)
                .ok()
                .map(|dt| dt.with_timezone(&Local)),
        };
        if parsed.is_some() {
            return parsed;
        }
    }

    // Generic ISO 8601
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in ISO_NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(local_from_naive(naive));
        }
    }

    tracing::warn!("Unrecognized date format '{}'", text);
    None
}

/// Check that a `---` block holds `key: value` lines rather than prose
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");
        if !is_valid_key {
            return false;
        }
        let after_colon = &trimmed[colon_pos + 1..];
        after_colon.is_empty() || after_colon.starts_with(' ')
    })
}
