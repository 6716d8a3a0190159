//! One fully built, immutable view of the content tree

use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::content::{BlogPost, GroupSummary};
use crate::helpers::title_case;

/// Bucket for posts that sit directly in a column directory
pub const ROOT_SUBCOLUMN: &str = "root";

/// All read-optimized mappings produced by one scan.
///
/// A snapshot is never modified after [`Snapshot::build`]; a refresh builds
/// a new one and replaces the old one as a whole.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Pinned first, then newest first
    posts: Vec<Arc<BlogPost>>,
    by_slug: HashMap<String, Arc<BlogPost>>,
    groups: IndexMap<String, GroupSummary>,
    posts_by_group: HashMap<String, Vec<Arc<BlogPost>>>,
    daily: Vec<Arc<BlogPost>>,
    columns: BTreeMap<String, BTreeMap<String, Vec<Arc<BlogPost>>>>,
}

impl Snapshot {
    /// Build every mapping from posts in scan order (sorted file paths).
    ///
    /// When two files share a slug the later one wins the slug lookup; both
    /// still appear in listings.
    pub fn build(scanned: Vec<BlogPost>) -> Self {
        let mut by_slug: HashMap<String, Arc<BlogPost>> = HashMap::new();
        let mut groups: IndexMap<String, GroupSummary> = IndexMap::new();
        let mut posts: Vec<Arc<BlogPost>> = Vec::with_capacity(scanned.len());

        for post in scanned {
            let post = Arc::new(post);

            if let Some(previous) = by_slug.insert(post.slug.clone(), Arc::clone(&post)) {
                tracing::warn!(
                    "Duplicate slug '{}': {} replaces {}",
                    post.slug,
                    post.source,
                    previous.source
                );
            }

            if let Some(group_slug) = &post.group_slug {
                let summary = groups
                    .entry(group_slug.clone())
                    .or_insert_with(|| GroupSummary {
                        slug: group_slug.clone(),
                        name: post
                            .group_label
                            .clone()
                            .filter(|label| !label.is_empty())
                            .unwrap_or_else(|| title_case(group_slug)),
                        description: post.group_description.clone(),
                        post_count: 0,
                    });
                summary.post_count += 1;
                let missing = summary.description.as_deref().map_or(true, str::is_empty);
                if missing && post.group_description.as_deref().is_some_and(|d| !d.is_empty()) {
                    summary.description = post.group_description.clone();
                }
            }

            posts.push(post);
        }

        // Stable: equal keys keep scan order
        posts.sort_by(|a, b| b.pinned.cmp(&a.pinned).then_with(|| b.date.cmp(&a.date)));

        let mut posts_by_group: HashMap<String, Vec<Arc<BlogPost>>> = HashMap::new();
        let mut daily = Vec::new();
        let mut columns: BTreeMap<String, BTreeMap<String, Vec<Arc<BlogPost>>>> = BTreeMap::new();

        for post in &posts {
            if let Some(group_slug) = &post.group_slug {
                posts_by_group
                    .entry(group_slug.clone())
                    .or_default()
                    .push(Arc::clone(post));
            }
            if post.is_daily {
                daily.push(Arc::clone(post));
            }
            if let Some(column) = &post.column {
                let subcolumn = post.subcolumn.as_deref().unwrap_or(ROOT_SUBCOLUMN);
                columns
                    .entry(column.clone())
                    .or_default()
                    .entry(subcolumn.to_string())
                    .or_default()
                    .push(Arc::clone(post));
            }
        }

        Self {
            posts,
            by_slug,
            groups,
            posts_by_group,
            daily,
            columns,
        }
    }

    /// Number of posts, daily included
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts in index order; daily posts only when asked for
    pub fn list_posts(&self, include_daily: bool) -> Vec<Arc<BlogPost>> {
        self.posts
            .iter()
            .filter(|post| include_daily || !post.is_daily)
            .cloned()
            .collect()
    }

    pub fn get_post(&self, slug: &str) -> Option<Arc<BlogPost>> {
        self.by_slug.get(slug).cloned()
    }

    pub fn list_daily_posts(&self) -> Vec<Arc<BlogPost>> {
        self.daily.clone()
    }

    /// Newest daily post, preferring the given language when one matches
    pub fn get_latest_daily(&self, lang: Option<&str>) -> Option<Arc<BlogPost>> {
        lang.and_then(|lang| self.daily.iter().find(|post| post.lang == lang))
            .or_else(|| self.daily.first())
            .cloned()
    }

    /// Groups ordered by lower-cased name
    pub fn list_groups(&self) -> Vec<GroupSummary> {
        let mut groups: Vec<GroupSummary> = self.groups.values().cloned().collect();
        groups.sort_by_key(|group| group.name.to_lowercase());
        groups
    }

    pub fn get_group(&self, slug: &str) -> Option<GroupSummary> {
        self.groups.get(slug).cloned()
    }

    pub fn list_posts_by_group(&self, slug: &str) -> Vec<Arc<BlogPost>> {
        self.posts_by_group.get(slug).cloned().unwrap_or_default()
    }

    /// Posts carrying the tag (case-insensitive), in index order
    pub fn list_posts_by_tag(&self, tag: &str) -> Vec<Arc<BlogPost>> {
        self.posts
            .iter()
            .filter(|post| post.has_tag(tag))
            .cloned()
            .collect()
    }

    /// Column names in lexicographic order
    pub fn list_columns(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Named subcolumns of a column; the root bucket is not listed
    pub fn list_subcolumns(&self, column: &str) -> Vec<String> {
        self.columns
            .get(column)
            .map(|subs| {
                subs.keys()
                    .filter(|name| name.as_str() != ROOT_SUBCOLUMN)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Posts of a column.
    ///
    /// With a subcolumn, that bucket in index order. Without one, every
    /// bucket merged and ordered by date alone: pinned posts do not float
    /// here, unlike the global listing.
    pub fn list_posts_by_column(&self, column: &str, subcolumn: Option<&str>) -> Vec<Arc<BlogPost>> {
        let Some(subs) = self.columns.get(column) else {
            return Vec::new();
        };

        match subcolumn {
            Some(subcolumn) => subs.get(subcolumn).cloned().unwrap_or_default(),
            None => {
                let mut merged: Vec<Arc<BlogPost>> = subs.values().flatten().cloned().collect();
                merged.sort_by(|a, b| b.date.cmp(&a.date));
                merged
            }
        }
    }
}

/// Keep posts whose language is exactly `lang`, preserving order
pub fn filter_by_language(posts: &[Arc<BlogPost>], lang: &str) -> Vec<Arc<BlogPost>> {
    posts
        .iter()
        .filter(|post| post.lang == lang)
        .cloned()
        .collect()
}
