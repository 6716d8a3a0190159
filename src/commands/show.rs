//! Show a single post

use anyhow::Result;

use crate::Blog;

/// Print one post by slug, as text or JSON
pub fn run(blog: &Blog, slug: &str, json: bool) -> Result<()> {
    let index = blog.index();
    let Some(post) = index.get_post(slug) else {
        anyhow::bail!("Post not found: {}", slug);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&*post)?);
        return Ok(());
    }

    let badges = blog.tag_collections().build_badges(&post.tags);
    let labels: Vec<&str> = badges.iter().map(|b| b.label.as_str()).collect();

    println!("{}", post.title);
    println!("  slug:    {}", post.slug);
    println!("  date:    {}", post.display_date());
    println!("  source:  {}", post.source);
    println!("  lang:    {}", post.lang);
    if let Some(group) = &post.group_label {
        println!("  group:   {}", group);
    }
    if let Some(column) = &post.column {
        match &post.subcolumn {
            Some(sub) => println!("  column:  {}/{}", column, sub),
            None => println!("  column:  {}", column),
        }
    }
    if !labels.is_empty() {
        println!("  tags:    {}", labels.join(", "));
    }
    if post.pinned {
        println!("  pinned");
    }
    if post.is_daily {
        println!("  daily");
    }
    println!();
    println!("{}", post.summary);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_show_post() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(
            dir.path().join("content/hello.md"),
            "---\ntitle: Hello\n---\nHi there",
        )
        .unwrap();
        let blog = Blog::new(dir.path()).unwrap();

        assert!(run(&blog, "hello", false).is_ok());
        assert!(run(&blog, "hello", true).is_ok());
        assert!(run(&blog, "nope", false).is_err());
    }
}
