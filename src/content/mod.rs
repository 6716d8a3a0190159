//! Content module - parses markdown files into posts

mod frontmatter;
pub mod loader;
mod markdown;
mod post;
mod shortcode;

pub use frontmatter::{normalize_tags, resolve_date, slugify, FrontMatter, GroupMeta, MetaValue};
pub use loader::{LoadError, Placement, PostBuilder};
pub use markdown::MarkdownRenderer;
pub use post::{BlogPost, GroupSummary};
pub use shortcode::{Expansion, ShortcodeExpander};
