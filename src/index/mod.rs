//! Content index - the in-memory view of every post
//!
//! [`ContentIndex::refresh`] rescans the whole content root, builds a fresh
//! [`Snapshot`] and publishes it with one atomic pointer swap. Readers call
//! [`ContentIndex::snapshot`] (or the delegating query methods) and always
//! see one complete snapshot, never a half-built one.

mod snapshot;

pub use snapshot::{filter_by_language, Snapshot, ROOT_SUBCOLUMN};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::content::loader::{is_markdown_file, PostBuilder};
use crate::content::{BlogPost, GroupSummary};
use crate::Blog;

/// Outcome of one refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Posts now in the index
    pub loaded: usize,
    /// Drafts, unpublished and empty documents
    pub skipped: usize,
    /// Files that could not be read or parsed
    pub failed: usize,
}

/// Owns the current snapshot and the rebuild protocol
pub struct ContentIndex {
    builder: PostBuilder,
    current: ArcSwap<Snapshot>,
    /// Serializes refreshes; readers never take it
    refresh_lock: Mutex<()>,
}

impl ContentIndex {
    /// Create an empty index; call [`ContentIndex::refresh`] to populate it
    pub fn new(builder: PostBuilder) -> Self {
        Self {
            builder,
            current: ArcSwap::from_pointee(Snapshot::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Create and populate the index for a blog
    pub fn open(blog: &Blog) -> Self {
        let index = Self::new(PostBuilder::new(blog));
        index.refresh();
        index
    }

    pub fn content_root(&self) -> &Path {
        self.builder.content_root()
    }

    /// Rescan the content root and publish a new snapshot.
    ///
    /// A file that fails to load is logged and left out; it never stops the
    /// scan. A missing root is created and results in an empty index.
    pub fn refresh(&self) -> RefreshStats {
        let _guard = self.refresh_lock.lock();
        let start = std::time::Instant::now();
        let root = self.builder.content_root();

        if !root.exists() {
            match fs::create_dir_all(root) {
                Ok(()) => tracing::info!("Created content root {:?}", root),
                Err(e) => tracing::warn!("Failed to create content root {:?}: {}", root, e),
            }
            self.current.store(Arc::new(Snapshot::default()));
            return RefreshStats::default();
        }

        let mut stats = RefreshStats::default();
        let mut posts: Vec<BlogPost> = Vec::new();

        for path in markdown_files(root) {
            match self.builder.build(&path) {
                Ok(Some(post)) => {
                    stats.loaded += 1;
                    posts.push(post);
                }
                Ok(None) => stats.skipped += 1,
                Err(e) => {
                    tracing::warn!("Failed to load post: {}", e);
                    stats.failed += 1;
                }
            }
        }

        let snapshot = Snapshot::build(posts);
        self.current.store(Arc::new(snapshot));

        tracing::info!(
            "Indexed {} posts ({} skipped, {} failed) in {:?}",
            stats.loaded,
            stats.skipped,
            stats.failed,
            start.elapsed()
        );
        stats
    }

    /// The last published snapshot; stays valid across later refreshes
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn list_posts(&self, include_daily: bool) -> Vec<Arc<BlogPost>> {
        self.current.load().list_posts(include_daily)
    }

    pub fn get_post(&self, slug: &str) -> Option<Arc<BlogPost>> {
        self.current.load().get_post(slug)
    }

    pub fn list_daily_posts(&self) -> Vec<Arc<BlogPost>> {
        self.current.load().list_daily_posts()
    }

    pub fn get_latest_daily(&self, lang: Option<&str>) -> Option<Arc<BlogPost>> {
        self.current.load().get_latest_daily(lang)
    }

    pub fn list_groups(&self) -> Vec<GroupSummary> {
        self.current.load().list_groups()
    }

    pub fn get_group(&self, slug: &str) -> Option<GroupSummary> {
        self.current.load().get_group(slug)
    }

    pub fn list_posts_by_group(&self, slug: &str) -> Vec<Arc<BlogPost>> {
        self.current.load().list_posts_by_group(slug)
    }

    pub fn list_posts_by_tag(&self, tag: &str) -> Vec<Arc<BlogPost>> {
        self.current.load().list_posts_by_tag(tag)
    }

    pub fn list_columns(&self) -> Vec<String> {
        self.current.load().list_columns()
    }

    pub fn list_subcolumns(&self, column: &str) -> Vec<String> {
        self.current.load().list_subcolumns(column)
    }

    pub fn list_posts_by_column(&self, column: &str, subcolumn: Option<&str>) -> Vec<Arc<BlogPost>> {
        self.current.load().list_posts_by_column(column, subcolumn)
    }
}

/// Every markdown file under `root`, in sorted path order
fn markdown_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Failed to read directory entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_markdown_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlogConfig;
    use std::thread;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ContentIndex) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        let builder = PostBuilder::with_config(dir.path(), &content, &BlogConfig::default());
        (dir, ContentIndex::new(builder))
    }

    fn write(dir: &TempDir, relative: &str, text: &str) {
        let path = dir.path().join("content").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn slugs(posts: &[Arc<BlogPost>]) -> Vec<String> {
        posts.iter().map(|p| p.slug.clone()).collect()
    }

    #[test]
    fn test_missing_root_is_created_and_clears_index() {
        let (dir, index) = setup();
        assert_eq!(index.refresh(), RefreshStats::default());
        assert!(dir.path().join("content").is_dir());
        assert!(index.list_posts(true).is_empty());

        write(&dir, "a.md", "Hello");
        index.refresh();
        assert_eq!(index.list_posts(true).len(), 1);

        fs::remove_dir_all(dir.path().join("content")).unwrap();
        index.refresh();
        assert!(index.list_posts(true).is_empty());
        assert!(index.get_post("a").is_none());
    }

    #[test]
    fn test_pinned_post_comes_first() {
        let (dir, index) = setup();
        write(&dir, "a.md", "---\npinned: true\ndate: 2024-01-01\n---\nA");
        write(&dir, "b.md", "---\ndate: 2025-01-01\n---\nB");
        index.refresh();
        assert_eq!(slugs(&index.list_posts(false)), vec!["a", "b"]);
    }

    #[test]
    fn test_every_document_once_and_bad_files_skipped() {
        let (dir, index) = setup();
        write(&dir, "one.md", "---\ndate: 2024-01-01\n---\nOne");
        write(&dir, "nested/two.md", "---\ndate: 2024-01-02\n---\nTwo");
        write(&dir, "daily/three.md", "---\ndate: 2024-01-03\n---\nThree");
        write(&dir, "draft.md", "---\ndraft: true\n---\nDraft");
        write(&dir, "empty.md", "---\ntitle: Nothing\n---\n");
        write(&dir, "broken.md", "---\ntitle: [oops\n---\nBroken");
        write(&dir, "notes.txt", "not markdown");

        let stats = index.refresh();
        assert_eq!(
            stats,
            RefreshStats {
                loaded: 3,
                skipped: 2,
                failed: 1
            }
        );
        assert_eq!(slugs(&index.list_posts(true)), vec!["three", "two", "one"]);
        assert_eq!(slugs(&index.list_posts(false)), vec!["two", "one"]);
        assert_eq!(slugs(&index.list_daily_posts()), vec!["three"]);
    }

    #[test]
    fn test_duplicate_slug_follows_path_order() {
        let (dir, index) = setup();
        write(&dir, "a/post.md", "---\nslug: dup\ntitle: From A\ndate: 2025-01-01\n---\nA");
        write(&dir, "b/post.md", "---\nslug: dup\ntitle: From B\ndate: 2020-01-01\n---\nB");
        index.refresh();
        assert_eq!(index.get_post("dup").unwrap().title, "From B");
        assert_eq!(index.list_posts(true).len(), 2);
    }

    #[test]
    fn test_columns_from_directory_layout() {
        let (dir, index) = setup();
        write(&dir, "columns/foo/bar/post.md", "Nested");
        write(&dir, "columns/foo/intro.md", "Intro");
        write(&dir, "daily/foo/post.md", "---\nslug: today\n---\nDaily");
        write(&dir, "root.md", "Root");
        index.refresh();

        let nested = index.get_post("post").unwrap();
        assert_eq!(nested.column.as_deref(), Some("foo"));
        assert_eq!(nested.subcolumn.as_deref(), Some("bar"));

        let daily = index.get_post("today").unwrap();
        assert_eq!(daily.column, None);
        assert!(daily.is_daily);

        assert_eq!(index.get_post("root").unwrap().column, None);
        assert_eq!(index.list_columns(), vec!["foo"]);
        assert_eq!(index.list_subcolumns("foo"), vec!["bar"]);
        assert_eq!(slugs(&index.list_posts_by_column("foo", Some("bar"))), vec!["post"]);
        assert_eq!(index.list_posts_by_column("foo", None).len(), 2);
    }

    #[test]
    fn test_groups_and_tags_through_index() {
        let (dir, index) = setup();
        write(&dir, "a.md", "---\ngroup: Announcements\ntags: [News]\ndate: 2024-01-01\n---\nA");
        write(
            &dir,
            "b.md",
            "---\ngroup:\n  name: Announcements\n  description: Site news\ntags: news\ndate: 2024-02-01\n---\nB",
        );
        index.refresh();

        let group = index.get_group("announcements").unwrap();
        assert_eq!(group.name, "Announcements");
        assert_eq!(group.post_count, 2);
        assert_eq!(group.description.as_deref(), Some("Site news"));
        assert_eq!(index.list_groups().len(), 1);
        assert_eq!(slugs(&index.list_posts_by_group("announcements")), vec!["b", "a"]);
        assert_eq!(slugs(&index.list_posts_by_tag("NEWS")), vec!["b", "a"]);
    }

    #[test]
    fn test_latest_daily_by_language() {
        let (dir, index) = setup();
        write(&dir, "daily/en.md", "---\ndate: 2024-01-01\n---\nEnglish");
        write(&dir, "daily/zh.md", "---\ndate: 2024-01-02\nlang: zh\n---\n中文");
        index.refresh();
        assert_eq!(index.get_latest_daily(None).unwrap().slug, "zh");
        assert_eq!(index.get_latest_daily(Some("en")).unwrap().slug, "en");
        assert_eq!(index.get_latest_daily(Some("ja")).unwrap().slug, "zh");
    }

    #[test]
    fn test_old_snapshot_is_never_patched() {
        let (dir, index) = setup();
        write(&dir, "a.md", "A");
        index.refresh();
        let before = index.snapshot();

        write(&dir, "b.md", "B");
        index.refresh();

        assert_eq!(before.len(), 1);
        assert!(before.get_post("b").is_none());
        assert_eq!(index.snapshot().len(), 2);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let (dir, index) = setup();
        write(&dir, "a.md", "---\ndate: 2024-01-01\n---\nA");
        write(&dir, "b.md", "---\ndate: 2024-01-02\ngroup: G\n---\nB");
        index.refresh();
        let first = slugs(&index.list_posts(true));
        let groups = index.list_groups();
        index.refresh();
        assert_eq!(slugs(&index.list_posts(true)), first);
        assert_eq!(index.list_groups(), groups);
    }

    #[test]
    fn test_readers_see_whole_snapshots_during_refresh() {
        let (dir, index) = setup();
        for i in 0..20 {
            write(&dir, &format!("p{:02}.md", i), &format!("---\ngroup: G\n---\nPost {}", i));
        }
        index.refresh();
        let index = Arc::new(index);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let snapshot = index.snapshot();
                        let posts = snapshot.list_posts(true);
                        let count = snapshot.get_group("g").map(|g| g.post_count).unwrap_or(0);
                        assert_eq!(posts.len(), count);
                        for post in &posts {
                            assert!(snapshot.get_post(&post.slug).is_some());
                        }
                    }
                })
            })
            .collect();

        for i in 20..30 {
            write(&dir, &format!("p{:02}.md", i), &format!("---\ngroup: G\n---\nPost {}", i));
            index.refresh();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(index.list_posts(true).len(), 30);
    }
}
