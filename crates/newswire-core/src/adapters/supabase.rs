use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    cache_key, ensure_limit, ensure_search_term, html_to_text, post_comments_key, RestClient,
};
use crate::cache::CacheStore;
use crate::clock::Clock;
use crate::config::SupabaseConfig;
use crate::http_client::{HttpClient, HttpRequest};
use crate::news_source::{NewsSource, Operation, SourceError, SourceFuture};
use crate::{BackendId, Comment, CommentSubmission, FormattedArticle, UtcDateTime};

const REST_PREFIX: &str = "/rest/v1";
const LIST_COLUMNS: &str =
    "id,title,slug,excerpt,image_url,published_at,link,author,comment_count,category:categories(name)";
const FULL_COLUMNS: &str = "id,title,slug,excerpt,content,image_url,published_at,link,author,comment_count,category:categories(name)";
const UNCATEGORIZED: &str = "Uncategorized";

/// Supabase (PostgREST) adapter over the `articles`, `categories` and
/// `comments` tables.
#[derive(Clone)]
pub struct SupabaseAdapter {
    rest_base: String,
    anon_key: String,
    rest: RestClient,
}

impl SupabaseAdapter {
    pub fn new(config: &SupabaseConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            rest_base: format!("{}{REST_PREFIX}", config.url.trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            rest: RestClient::new(BackendId::Supabase, http_client),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rest.set_timeout(timeout);
        self
    }

    pub fn with_cache_ttl(self, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        self.with_cache(CacheStore::with_clock(ttl, clock))
    }

    pub fn with_cache(mut self, cache: CacheStore<String>) -> Self {
        self.rest.cache = cache;
        self
    }

    pub fn cache(&self) -> &CacheStore<String> {
        &self.rest.cache
    }

    fn request(&self, table: &str, query: &str) -> HttpRequest {
        HttpRequest::get(format!("{}/{table}?{query}", self.rest_base))
            .with_anon_key(&self.anon_key)
    }

    async fn fetch_articles(
        &self,
        operation: Operation,
        query: String,
    ) -> Result<Vec<FormattedArticle>, SourceError> {
        let request = self.request("articles", &query);
        let rows: Vec<SbArticle> = self
            .rest
            .get_json(cache_key(operation, &query), request)
            .await?;

        rows.into_iter().map(SbArticle::into_article).collect()
    }

    async fn fetch_comments(&self, key: String, query: &str) -> Result<Vec<Comment>, SourceError> {
        let request = self.request("comments", query);
        let rows: Vec<SbComment> = self.rest.get_json(key, request).await?;

        rows.into_iter().map(SbComment::into_comment).collect()
    }
}

fn latest(columns: &str, filter: &str, limit: usize) -> String {
    format!("select={columns}{filter}&order=published_at.desc&limit={limit}")
}

/// PostgREST `or` filter matching `term` in title or excerpt, quoted so
/// reserved characters in the term stay literal.
fn search_filter(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('"', "\\\"");
    let filter = format!("(title.ilike.\"*{escaped}*\",excerpt.ilike.\"*{escaped}*\")");
    format!("&or={}", urlencoding::encode(&filter))
}

impl NewsSource for SupabaseAdapter {
    fn id(&self) -> BackendId {
        BackendId::Supabase
    }

    fn probe<'a>(&'a self) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            self.rest
                .send(self.request("articles", "select=id&limit=1"))
                .await
                .map(|_| ())
        })
    }

    fn latest_news_for_slider<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::Supabase, limit)?;
            self.fetch_articles(Operation::LatestForSlider, latest(LIST_COLUMNS, "", limit))
                .await
        })
    }

    fn latest_news_by_category_id<'a>(
        &'a self,
        category_id: u64,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::Supabase, limit)?;
            self.fetch_articles(
                Operation::ByCategoryId,
                latest(LIST_COLUMNS, &format!("&category_id=eq.{category_id}"), limit),
            )
            .await
        })
    }

    fn latest_news_by_category<'a>(
        &'a self,
        slug: &'a str,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::Supabase, limit)?;

            let query = format!(
                "select=id&slug=eq.{}&limit=1",
                urlencoding::encode(slug.trim())
            );
            let categories: Vec<SbCategoryId> = self
                .rest
                .get_json(
                    cache_key(Operation::ByCategorySlug, &query),
                    self.request("categories", &query),
                )
                .await?;

            let Some(category) = categories.first() else {
                return Ok(Vec::new());
            };

            self.fetch_articles(
                Operation::ByCategorySlug,
                latest(LIST_COLUMNS, &format!("&category_id=eq.{}", category.id), limit),
            )
            .await
        })
    }

    fn search_posts<'a>(
        &'a self,
        term: &'a str,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::Supabase, limit)?;
            let term = ensure_search_term(BackendId::Supabase, term)?;
            self.fetch_articles(
                Operation::Search,
                latest(LIST_COLUMNS, &search_filter(term), limit),
            )
            .await
        })
    }

    fn post_by_id<'a>(&'a self, id: u64) -> SourceFuture<'a, Option<FormattedArticle>> {
        Box::pin(async move {
            let articles = self
                .fetch_articles(
                    Operation::PostById,
                    format!("select={FULL_COLUMNS}&id=eq.{id}&limit=1"),
                )
                .await?;
            Ok(articles.into_iter().next())
        })
    }

    fn fetch_latest_posts<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::Supabase, limit)?;
            self.fetch_articles(Operation::LatestPosts, latest(FULL_COLUMNS, "", limit))
                .await
        })
    }

    fn fetch_comments_by_post_id<'a>(&'a self, post_id: u64) -> SourceFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            self.fetch_comments(
                post_comments_key(post_id),
                &format!("select=*&article_id=eq.{post_id}&order=created_at.asc"),
            )
            .await
        })
    }

    fn fetch_recent_comments<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            ensure_limit(BackendId::Supabase, limit)?;
            let query = format!("select=*&order=created_at.desc&limit={limit}");
            self.fetch_comments(cache_key(Operation::RecentComments, &query), &query)
                .await
        })
    }

    fn submit_comment<'a>(&'a self, submission: &'a CommentSubmission) -> SourceFuture<'a, Comment> {
        Box::pin(async move {
            let row = SbNewComment {
                article_id: submission.post_id,
                author_name: &submission.name,
                author_email: &submission.email,
                content: &submission.content,
                author_url: submission.url.as_deref(),
            };
            let body = serde_json::to_string(&row).map_err(|error| {
                SourceError::internal(format!("failed to encode supabase comment: {error}"))
            })?;

            let request = HttpRequest::post(format!("{}/comments", self.rest_base))
                .with_anon_key(&self.anon_key)
                .with_header("prefer", "return=representation")
                .with_json_body(body);
            let created: Vec<SbComment> = self.rest.send_json(request).await?;
            let comment = created
                .into_iter()
                .next()
                .ok_or_else(|| SourceError::malformed("supabase returned no created comment row"))?
                .into_comment()?;

            self.rest.invalidate_comments(submission.post_id).await;
            Ok(comment)
        })
    }
}

#[derive(Debug, Deserialize)]
struct SbCategoryName {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SbCategoryId {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct SbArticle {
    id: u64,
    title: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    published_at: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    comment_count: Option<u32>,
    #[serde(default)]
    category: Option<SbCategoryName>,
}

#[derive(Debug, Deserialize)]
struct SbComment {
    id: u64,
    article_id: u64,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    author_url: Option<String>,
    #[serde(default)]
    content: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct SbNewComment<'a> {
    article_id: u64,
    author_name: &'a str,
    author_email: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_url: Option<&'a str>,
}

impl SbArticle {
    fn into_article(self) -> Result<FormattedArticle, SourceError> {
        let category = self
            .category
            .map(|category| category.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| String::from(UNCATEGORIZED));

        Ok(FormattedArticle {
            id: self.id,
            title: self.title,
            date: parse_date(&self.published_at)?,
            excerpt: self
                .excerpt
                .map(|excerpt| html_to_text(&excerpt))
                .unwrap_or_default(),
            image: self.image_url.filter(|url| !url.is_empty()),
            category,
            slug: self.slug,
            link: self.link.unwrap_or_default(),
            content: self.content,
            author: self.author.filter(|author| !author.is_empty()),
            comment_count: self.comment_count,
        })
    }
}

impl SbComment {
    fn into_comment(self) -> Result<Comment, SourceError> {
        Ok(Comment {
            id: self.id,
            post_id: self.article_id,
            author_name: self.author_name,
            author_url: self.author_url.filter(|url| !url.is_empty()),
            content: self.content,
            date: parse_date(&self.created_at)?,
        })
    }
}

fn parse_date(value: &str) -> Result<UtcDateTime, SourceError> {
    UtcDateTime::parse(value)
        .map_err(|error| SourceError::malformed(format!("supabase returned an invalid date: {error}")))
}
