//! List indexed content

use anyhow::Result;
use std::sync::Arc;

use crate::content::BlogPost;
use crate::i18n::Languages;
use crate::index::{filter_by_language, ContentIndex};
use crate::tags::TagCollections;
use crate::Blog;

/// List content by type
pub fn run(blog: &Blog, content_type: &str, lang: Option<&str>) -> Result<()> {
    let index = blog.index();
    let snapshot = index.snapshot();
    let lang = lang.map(|l| blog.languages().normalize(Some(l)));
    let by_lang = |posts: Vec<Arc<BlogPost>>| match &lang {
        Some(lang) => filter_by_language(&posts, lang),
        None => posts,
    };

    match content_type {
        "post" | "posts" => print_posts("Posts", &by_lang(snapshot.list_posts(false))),
        "all" => print_posts("All posts", &by_lang(snapshot.list_posts(true))),
        "daily" => {
            print_posts("Daily", &by_lang(snapshot.list_daily_posts()));
            if let Some(latest) = snapshot.get_latest_daily(lang.as_deref()) {
                println!("Latest: {} [{}]", latest.title, latest.slug);
            }
        }
        "group" | "groups" => {
            let groups = snapshot.list_groups();
            println!("Groups ({}):", groups.len());
            for group in groups {
                println!("  {} ({}) [{}]", group.name, group.post_count, group.slug);
                if let Some(description) = &group.description {
                    println!("      {}", description);
                }
            }
        }
        "column" | "columns" => {
            let columns = snapshot.list_columns();
            println!("Columns ({}):", columns.len());
            for column in columns {
                let count = snapshot.list_posts_by_column(&column, None).len();
                println!("  {} ({})", column, count);
                for subcolumn in snapshot.list_subcolumns(&column) {
                    let count = snapshot
                        .list_posts_by_column(&column, Some(&subcolumn))
                        .len();
                    println!("    {} ({})", subcolumn, count);
                }
            }
        }
        "tag" | "tags" => {
            let collections = blog.tag_collections();
            let mut counts: indexmap::IndexMap<String, usize> = indexmap::IndexMap::new();
            for post in snapshot.list_posts(true) {
                for tag in &post.tags {
                    *counts.entry(tag.to_lowercase()).or_insert(0) += 1;
                }
            }
            counts.sort_by(|_, a, _, b| b.cmp(a));
            println!("Tags ({}):", counts.len());
            for (tag, count) in counts {
                let badge = collections.build_badges(std::slice::from_ref(&tag));
                match badge.first().and_then(|b| b.collection.as_ref()) {
                    Some(collection) => println!("  {} ({}) <{}>", tag, count, collection.name),
                    None => println!("  {} ({})", tag, count),
                }
            }
        }
        "collection" | "collections" => print_collections(&blog.tag_collections()),
        "lang" | "langs" | "languages" => {
            let languages = blog.languages();
            for code in languages.supported() {
                let count = filter_by_language(&snapshot.list_posts(true), code).len();
                println!("  {} {} ({})", code, Languages::display_name(code), count);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, all, daily, groups, columns, tags, collections, languages",
                content_type
            );
        }
    }

    Ok(())
}

/// Posts of one group
pub fn group(blog: &Blog, slug: &str) -> Result<()> {
    let index = blog.index();
    let Some(group) = index.get_group(slug) else {
        anyhow::bail!("Group not found: {}", slug);
    };
    println!("{} ({} posts)", group.name, group.post_count);
    print_posts("Posts", &index.list_posts_by_group(slug));
    Ok(())
}

/// Posts carrying a tag
pub fn tag(blog: &Blog, tag: &str) -> Result<()> {
    let index = blog.index();
    print_posts(&format!("Tagged '{}'", tag), &index.list_posts_by_tag(tag));
    Ok(())
}

/// Posts of a column, optionally narrowed to one subcolumn
pub fn column(blog: &Blog, column: &str, subcolumn: Option<&str>) -> Result<()> {
    let index: ContentIndex = blog.index();
    if !index.list_columns().iter().any(|c| c == column) {
        anyhow::bail!("Column not found: {}", column);
    }
    let title = match subcolumn {
        Some(sub) => format!("{}/{}", column, sub),
        None => column.to_string(),
    };
    print_posts(&title, &index.list_posts_by_column(column, subcolumn));
    Ok(())
}

fn print_posts(heading: &str, posts: &[Arc<BlogPost>]) {
    println!("{} ({}):", heading, posts.len());
    for post in posts {
        println!(
            "  {}{} - {} [{}] ({})",
            if post.pinned { "* " } else { "" },
            post.date.format("%Y-%m-%d"),
            post.title,
            post.slug,
            post.lang
        );
    }
}

fn print_collections(collections: &TagCollections) {
    let list = collections.collections();
    println!("Collections ({}):", list.len());
    for collection in list {
        let color = collection.color.as_deref().unwrap_or("-");
        println!("  {} [{}] {}", collection.name, collection.slug, color);
    }
}
