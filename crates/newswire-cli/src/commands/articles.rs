use newswire_core::{FormattedArticle, NewsServiceManager};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{ArticleArgs, CategoryArgs, LimitArgs, SearchArgs};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ArticlesResponseData {
    articles: Vec<FormattedArticle>,
}

#[derive(Debug, Serialize)]
struct ArticleResponseData {
    article: Option<FormattedArticle>,
}

fn articles(articles: Vec<FormattedArticle>) -> Result<Value, CliError> {
    Ok(serde_json::to_value(ArticlesResponseData { articles })?)
}

pub async fn slider(args: &LimitArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    articles(manager.latest_news_for_slider(args.limit).await?)
}

pub async fn category(args: &CategoryArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    let found = match (&args.slug, args.id) {
        (Some(slug), _) => manager.latest_news_by_category(slug, args.limit).await?,
        (None, Some(id)) => manager.latest_news_by_category_id(id, args.limit).await?,
        (None, None) => Vec::new(),
    };
    articles(found)
}

pub async fn search(args: &SearchArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    articles(manager.search_posts(&args.term, args.limit).await?)
}

pub async fn article(args: &ArticleArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    let article = manager.post_by_id(args.id).await?;
    Ok(serde_json::to_value(ArticleResponseData { article })?)
}

pub async fn posts(args: &LimitArgs, manager: &NewsServiceManager) -> Result<Value, CliError> {
    articles(manager.fetch_latest_posts(args.limit).await?)
}
