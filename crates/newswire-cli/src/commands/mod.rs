mod articles;
mod comments;
mod status;

use newswire_core::{NewsServiceBuilder, ServiceConfig};
use serde_json::Value;
use tracing::warn;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(mode) = cli.mode {
        config.default_mode = mode.into();
    }
    if !config.has_backend() {
        warn!("no backend configured; set NEWSWIRE_WORDPRESS_URL or NEWSWIRE_SUPABASE_URL and NEWSWIRE_SUPABASE_ANON_KEY");
    }

    let manager = NewsServiceBuilder::new(config).build();

    match &cli.command {
        Command::Slider(args) => articles::slider(args, &manager).await,
        Command::Category(args) => articles::category(args, &manager).await,
        Command::Search(args) => articles::search(args, &manager).await,
        Command::Article(args) => articles::article(args, &manager).await,
        Command::Posts(args) => articles::posts(args, &manager).await,
        Command::Comments(args) => comments::by_post(args, &manager).await,
        Command::RecentComments(args) => comments::recent(args, &manager).await,
        Command::Comment(args) => comments::submit(args, &manager).await,
        Command::Status => status::run(&manager).await,
    }
}
