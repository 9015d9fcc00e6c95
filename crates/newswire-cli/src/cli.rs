//! CLI argument definitions for newswire.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `slider` | Latest articles for the front-page slider |
//! | `category` | Latest articles in a category, by id or slug |
//! | `search` | Full-text article search |
//! | `article` | One article by id |
//! | `posts` | Latest articles with full content |
//! | `comments` | Comments on one article |
//! | `recent-comments` | Latest comments across all articles |
//! | `comment` | Submit a comment |
//! | `status` | Probe backends and show selection state |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--mode` | from `NEWSWIRE_SERVICE_MODE` | Backend selection mode |
//! | `--pretty` | `false` | Pretty-print JSON output |
//!
//! # Examples
//!
//! ```bash
//! newswire slider --limit 5
//! newswire --mode wordpress category --slug politics
//! newswire comment --post 42 --name Ada --email ada@example.com --content "Great read"
//! ```

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use newswire_core::ServiceMode;

/// newswire - news from WordPress or Supabase with automatic failover
#[derive(Debug, Parser)]
#[command(
    name = "newswire",
    author,
    version,
    about = "News from WordPress or Supabase with automatic failover",
    long_about = "newswire reads articles and comments from a WordPress site or a Supabase \
project, whichever is healthy, and fails over between them.\n\
\n\
Backends are configured through NEWSWIRE_* environment variables or a .env file. \
Set RUST_LOG to see selection and failover decisions."
)]
pub struct Cli {
    /// Backend selection mode; overrides NEWSWIRE_SERVICE_MODE.
    #[arg(long, global = true, value_enum)]
    pub mode: Option<ModeSelector>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Backend selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeSelector {
    /// Healthiest backend, Supabase preferred.
    Auto,
    /// Always WordPress while it is configured.
    Wordpress,
    /// Always Supabase while it is configured.
    Supabase,
}

impl From<ModeSelector> for ServiceMode {
    fn from(value: ModeSelector) -> Self {
        match value {
            ModeSelector::Auto => Self::Auto,
            ModeSelector::Wordpress => Self::WordPress,
            ModeSelector::Supabase => Self::Supabase,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Latest articles for the front-page slider.
    Slider(LimitArgs),
    /// Latest articles in one category.
    Category(CategoryArgs),
    /// Search articles by title and excerpt.
    Search(SearchArgs),
    /// One article with its full content.
    Article(ArticleArgs),
    /// Latest articles with full content.
    Posts(LimitArgs),
    /// Comments on one article, oldest first.
    Comments(CommentsArgs),
    /// Latest comments across all articles.
    RecentComments(LimitArgs),
    /// Submit a comment on an article.
    Comment(CommentArgs),
    /// Probe both backends and show the selection state.
    Status,
}

#[derive(Debug, Clone, Args)]
pub struct LimitArgs {
    /// Maximum number of items.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("category").required(true).args(["id", "slug"])))]
pub struct CategoryArgs {
    /// Numeric category id.
    #[arg(long)]
    pub id: Option<u64>,

    /// Category slug, e.g. `politics`.
    #[arg(long)]
    pub slug: Option<String>,

    /// Maximum number of articles.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Search term.
    pub term: String,

    /// Maximum number of articles.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Clone, Args)]
pub struct ArticleArgs {
    /// Article id.
    pub id: u64,
}

#[derive(Debug, Clone, Args)]
pub struct CommentsArgs {
    /// Article id.
    pub post_id: u64,
}

#[derive(Debug, Clone, Args)]
pub struct CommentArgs {
    /// Article id the comment belongs to.
    #[arg(long)]
    pub post: u64,

    /// Display name of the author.
    #[arg(long)]
    pub name: String,

    /// Author email address; not published.
    #[arg(long)]
    pub email: String,

    /// Comment text.
    #[arg(long)]
    pub content: String,

    /// Optional author website.
    #[arg(long)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_mode_after_subcommand() {
        let cli = Cli::try_parse_from(["newswire", "slider", "--limit", "3", "--mode", "wordpress"])
            .expect("valid arguments");

        assert_eq!(cli.mode, Some(ModeSelector::Wordpress));
        assert!(matches!(cli.command, Command::Slider(LimitArgs { limit: 3 })));
    }

    #[test]
    fn category_requires_id_or_slug() {
        assert!(Cli::try_parse_from(["newswire", "category"]).is_err());
        assert!(Cli::try_parse_from(["newswire", "category", "--id", "2", "--slug", "x"]).is_err());

        let cli = Cli::try_parse_from(["newswire", "category", "--slug", "politics"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Command::Category(CategoryArgs { slug: Some(ref slug), .. }) if slug == "politics"
        ));
    }

    #[test]
    fn recent_comments_uses_kebab_case() {
        let cli = Cli::try_parse_from(["newswire", "recent-comments"]).expect("valid arguments");
        assert!(matches!(cli.command, Command::RecentComments(LimitArgs { limit: 10 })));
    }
}
