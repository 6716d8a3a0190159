//! CLI entry point for mdpress

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdpress")]
#[command(author = "Yukang Chen")]
#[command(version = "0.1.0")]
#[command(about = "Inspect the content index of a markdown blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the content root and report what was indexed
    Refresh,

    /// List indexed content
    #[command(alias = "ls")]
    List {
        /// Type of content to list (posts, all, daily, groups, columns, tags, collections, languages)
        #[arg(default_value = "posts")]
        r#type: String,

        /// Only show posts in this language
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Show a single post
    Show {
        /// Post slug
        slug: String,

        /// Print the full post as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the posts of a group
    Group {
        /// Group slug
        slug: String,
    },

    /// List the posts carrying a tag
    Tag {
        /// Tag name (case-insensitive)
        tag: String,
    },

    /// List the posts of a column
    Column {
        /// Column name
        column: String,

        /// Subcolumn name
        subcolumn: Option<String>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mdpress=debug,info"
    } else {
        "mdpress=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Refresh => {
            let blog = mdpress::Blog::new(&base_dir)?;
            let index = mdpress::index::ContentIndex::new(mdpress::content::PostBuilder::new(&blog));
            let stats = index.refresh();
            println!(
                "Indexed {} posts from {:?} ({} skipped, {} failed)",
                stats.loaded,
                index.content_root(),
                stats.skipped,
                stats.failed
            );
        }

        Commands::List { r#type, lang } => {
            let blog = mdpress::Blog::new(&base_dir)?;
            mdpress::commands::list::run(&blog, &r#type, lang.as_deref())?;
        }

        Commands::Show { slug, json } => {
            let blog = mdpress::Blog::new(&base_dir)?;
            mdpress::commands::show::run(&blog, &slug, json)?;
        }

        Commands::Group { slug } => {
            let blog = mdpress::Blog::new(&base_dir)?;
            mdpress::commands::list::group(&blog, &slug)?;
        }

        Commands::Tag { tag } => {
            let blog = mdpress::Blog::new(&base_dir)?;
            mdpress::commands::list::tag(&blog, &tag)?;
        }

        Commands::Column { column, subcolumn } => {
            let blog = mdpress::Blog::new(&base_dir)?;
            mdpress::commands::list::column(&blog, &column, subcolumn.as_deref())?;
        }

        Commands::Version => {
            println!("mdpress version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
