use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    cache_key, ensure_limit, ensure_search_term, html_to_text, post_comments_key, RestClient,
};
use crate::cache::CacheStore;
use crate::clock::Clock;
use crate::config::WordPressConfig;
use crate::http_client::{HttpClient, HttpRequest};
use crate::news_source::{NewsSource, Operation, SourceError, SourceFuture};
use crate::{BackendId, Comment, CommentSubmission, FormattedArticle, UtcDateTime};

const API_PREFIX: &str = "/wp-json/wp/v2";
const MAX_PER_PAGE: usize = 100;
const UNCATEGORIZED: &str = "Uncategorized";

/// WordPress REST API adapter.
#[derive(Clone)]
pub struct WordPressAdapter {
    api_base: String,
    rest: RestClient,
}

impl WordPressAdapter {
    /// `config.base_url` may be the site root or already end in
    /// `/wp-json/wp/v2`.
    pub fn new(config: &WordPressConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let root = config.base_url.trim_end_matches('/');
        let api_base = if root.ends_with(API_PREFIX) {
            root.to_owned()
        } else {
            format!("{root}{API_PREFIX}")
        };

        Self {
            api_base,
            rest: RestClient::new(BackendId::WordPress, http_client),
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

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn posts_url(&self, query: &str) -> String {
        format!("{}/posts?_embed&{query}", self.api_base)
    }

    async fn fetch_posts(
        &self,
        operation: Operation,
        query: String,
        with_content: bool,
    ) -> Result<Vec<FormattedArticle>, SourceError> {
        let request = HttpRequest::get(self.posts_url(&query));
        let posts: Vec<WpPost> = self
            .rest
            .get_json(cache_key(operation, &query), request)
            .await?;

        posts
            .into_iter()
            .map(|post| post.into_article(with_content))
            .collect()
    }

    async fn fetch_comments(&self, key: String, query: &str) -> Result<Vec<Comment>, SourceError> {
        let request = HttpRequest::get(format!("{}/comments?{query}", self.api_base));
        let comments: Vec<WpComment> = self.rest.get_json(key, request).await?;

        comments.into_iter().map(WpComment::into_comment).collect()
    }
}

fn per_page(limit: usize) -> usize {
    limit.min(MAX_PER_PAGE)
}

impl NewsSource for WordPressAdapter {
    fn id(&self) -> BackendId {
        BackendId::WordPress
    }

    fn probe<'a>(&'a self) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            let request = HttpRequest::get(format!("{}/posts?per_page=1", self.api_base));
            self.rest.send(request).await.map(|_| ())
        })
    }

    fn latest_news_for_slider<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::WordPress, limit)?;
            self.fetch_posts(
                Operation::LatestForSlider,
                format!("per_page={}", per_page(limit)),
                false,
            )
            .await
        })
    }

    fn latest_news_by_category_id<'a>(
        &'a self,
        category_id: u64,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::WordPress, limit)?;
            self.fetch_posts(
                Operation::ByCategoryId,
                format!("categories={category_id}&per_page={}", per_page(limit)),
                false,
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
            ensure_limit(BackendId::WordPress, limit)?;

            let query = format!("slug={}", urlencoding::encode(slug.trim()));
            let request = HttpRequest::get(format!("{}/categories?{query}", self.api_base));
            let categories: Vec<WpCategory> = self
                .rest
                .get_json(cache_key(Operation::ByCategorySlug, &query), request)
                .await?;

            let Some(category) = categories.first() else {
                return Ok(Vec::new());
            };

            self.fetch_posts(
                Operation::ByCategorySlug,
                format!("categories={}&per_page={}", category.id, per_page(limit)),
                false,
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
            ensure_limit(BackendId::WordPress, limit)?;
            let term = ensure_search_term(BackendId::WordPress, term)?;
            self.fetch_posts(
                Operation::Search,
                format!(
                    "search={}&per_page={}",
                    urlencoding::encode(term),
                    per_page(limit)
                ),
                false,
            )
            .await
        })
    }

    fn post_by_id<'a>(&'a self, id: u64) -> SourceFuture<'a, Option<FormattedArticle>> {
        Box::pin(async move {
            let posts = self
                .fetch_posts(Operation::PostById, format!("include={id}"), true)
                .await?;
            Ok(posts.into_iter().find(|post| post.id == id))
        })
    }

    fn fetch_latest_posts<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            ensure_limit(BackendId::WordPress, limit)?;
            self.fetch_posts(
                Operation::LatestPosts,
                format!("per_page={}", per_page(limit)),
                true,
            )
            .await
        })
    }

    fn fetch_comments_by_post_id<'a>(&'a self, post_id: u64) -> SourceFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            self.fetch_comments(
                post_comments_key(post_id),
                &format!("post={post_id}&per_page={MAX_PER_PAGE}&order=asc"),
            )
            .await
        })
    }

    fn fetch_recent_comments<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            ensure_limit(BackendId::WordPress, limit)?;
            let query = format!("per_page={}&order=desc", per_page(limit));
            self.fetch_comments(cache_key(Operation::RecentComments, &query), &query)
                .await
        })
    }

    fn submit_comment<'a>(&'a self, submission: &'a CommentSubmission) -> SourceFuture<'a, Comment> {
        Box::pin(async move {
            let payload = WpNewComment {
                post: submission.post_id,
                author_name: &submission.name,
                author_email: &submission.email,
                content: &submission.content,
                author_url: submission.url.as_deref(),
            };
            let body = serde_json::to_string(&payload).map_err(|error| {
                SourceError::internal(format!("failed to encode wordpress comment: {error}"))
            })?;

            let request =
                HttpRequest::post(format!("{}/comments", self.api_base)).with_json_body(body);
            let created: WpComment = self.rest.send_json(request).await?;
            let comment = created.into_comment()?;

            self.rest.invalidate_comments(submission.post_id).await;
            Ok(comment)
        })
    }
}

#[derive(Debug, Deserialize)]
struct WpRendered {
    #[serde(default)]
    rendered: String,
}

#[derive(Debug, Deserialize)]
struct WpPost {
    id: u64,
    date_gmt: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    link: String,
    title: WpRendered,
    excerpt: WpRendered,
    #[serde(default)]
    content: Option<WpRendered>,
    #[serde(default, rename = "_embedded")]
    embedded: Option<WpEmbedded>,
}

#[derive(Debug, Default, Deserialize)]
struct WpEmbedded {
    #[serde(default)]
    author: Vec<WpAuthor>,
    #[serde(default, rename = "wp:featuredmedia")]
    featured_media: Vec<WpMedia>,
    #[serde(default, rename = "wp:term")]
    terms: Vec<Vec<WpTerm>>,
}

#[derive(Debug, Deserialize)]
struct WpAuthor {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WpMedia {
    #[serde(default)]
    source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WpTerm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    taxonomy: String,
}

#[derive(Debug, Deserialize)]
struct WpCategory {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct WpComment {
    id: u64,
    post: u64,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    author_url: String,
    content: WpRendered,
    date_gmt: String,
}

#[derive(Debug, Serialize)]
struct WpNewComment<'a> {
    post: u64,
    author_name: &'a str,
    author_email: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_url: Option<&'a str>,
}

impl WpPost {
    fn into_article(self, with_content: bool) -> Result<FormattedArticle, SourceError> {
        let embedded = self.embedded.unwrap_or_default();

        let category = embedded
            .terms
            .iter()
            .flatten()
            .find(|term| term.taxonomy == "category" && !term.name.is_empty())
            .map(|term| html_to_text(&term.name))
            .unwrap_or_else(|| String::from(UNCATEGORIZED));
        let image = embedded
            .featured_media
            .into_iter()
            .find_map(|media| media.source_url)
            .filter(|url| !url.is_empty());
        let author = embedded
            .author
            .into_iter()
            .find_map(|author| author.name)
            .filter(|name| !name.is_empty());

        Ok(FormattedArticle {
            id: self.id,
            title: html_to_text(&self.title.rendered),
            date: parse_date(&self.date_gmt)?,
            excerpt: html_to_text(&self.excerpt.rendered),
            image,
            category,
            slug: self.slug,
            link: self.link,
            content: if with_content {
                self.content.map(|content| content.rendered)
            } else {
                None
            },
            author,
            comment_count: None,
        })
    }
}

impl WpComment {
    fn into_comment(self) -> Result<Comment, SourceError> {
        Ok(Comment {
            id: self.id,
            post_id: self.post,
            author_name: self.author_name,
            author_url: Some(self.author_url).filter(|url| !url.is_empty()),
            content: html_to_text(&self.content.rendered),
            date: parse_date(&self.date_gmt)?,
        })
    }
}

fn parse_date(value: &str) -> Result<UtcDateTime, SourceError> {
    UtcDateTime::parse(value)
        .map_err(|error| SourceError::malformed(format!("wordpress returned an invalid date: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpMethod, HttpResponse, StubHttpClient};
    use crate::news_source::SourceErrorKind;

    const BASE: &str = "https://news.example.test";

    const POSTS: &str = r#"[
        {
            "id": 42,
            "date_gmt": "2024-03-01T09:30:00",
            "slug": "budget-vote",
            "link": "https://news.example.test/budget-vote",
            "title": {"rendered": "Budget &amp; the vote"},
            "excerpt": {"rendered": "<p>Council meets&hellip;</p>\n"},
            "content": {"rendered": "<p>Full story.</p>"},
            "_embedded": {
                "author": [{"name": "Grace"}],
                "wp:featuredmedia": [{"source_url": "https://cdn.example.test/budget.jpg"}],
                "wp:term": [[{"name": "Politics", "taxonomy": "category"}], [{"name": "city", "taxonomy": "post_tag"}]]
            }
        }
    ]"#;

    fn adapter(stub: &StubHttpClient) -> WordPressAdapter {
        WordPressAdapter::new(
            &WordPressConfig {
                base_url: String::from(BASE),
            },
            Arc::new(stub.clone()),
        )
    }

    #[test]
    fn api_base_accepts_site_root_or_full_api_path() {
        let stub = StubHttpClient::new();
        assert_eq!(adapter(&stub).api_base(), "https://news.example.test/wp-json/wp/v2");

        let full = WordPressAdapter::new(
            &WordPressConfig {
                base_url: String::from("https://news.example.test/wp-json/wp/v2/"),
            },
            Arc::new(stub),
        );
        assert_eq!(full.api_base(), "https://news.example.test/wp-json/wp/v2");
    }

    #[tokio::test]
    async fn maps_embedded_post_fields() {
        let stub = StubHttpClient::new();
        stub.respond(HttpMethod::Get, "/posts?_embed&per_page=5", HttpResponse::ok_json(POSTS));

        let articles = adapter(&stub)
            .latest_news_for_slider(5)
            .await
            .expect("posts decode");

        let article = &articles[0];
        assert_eq!(article.id, 42);
        assert_eq!(article.title, "Budget & the vote");
        assert_eq!(article.excerpt, "Council meets\u{2026}");
        assert_eq!(article.category, "Politics");
        assert_eq!(article.image.as_deref(), Some("https://cdn.example.test/budget.jpg"));
        assert_eq!(article.author.as_deref(), Some("Grace"));
        assert_eq!(article.date.format_rfc3339(), "2024-03-01T09:30:00Z");
        assert_eq!(article.content, None);
    }

    #[tokio::test]
    async fn latest_posts_keep_rendered_content() {
        let stub = StubHttpClient::new();
        stub.respond(HttpMethod::Get, "/posts?_embed", HttpResponse::ok_json(POSTS));

        let articles = adapter(&stub).fetch_latest_posts(1).await.expect("posts");

        assert_eq!(articles[0].content.as_deref(), Some("<p>Full story.</p>"));
    }

    #[tokio::test]
    async fn unknown_category_slug_yields_empty_list() {
        let stub = StubHttpClient::new();
        stub.respond(HttpMethod::Get, "/categories?slug=ghost", HttpResponse::ok_json("[]"));

        let articles = adapter(&stub)
            .latest_news_by_category("ghost", 5)
            .await
            .expect("empty list");

        assert!(articles.is_empty());
        assert_eq!(stub.count("/posts"), 0);
    }

    #[tokio::test]
    async fn missing_post_is_none() {
        let stub = StubHttpClient::new();
        stub.respond(HttpMethod::Get, "include=404", HttpResponse::ok_json("[]"));

        assert_eq!(adapter(&stub).post_by_id(404).await, Ok(None));
    }

    #[tokio::test]
    async fn invalid_input_fails_before_any_request() {
        let stub = StubHttpClient::new();
        let wordpress = adapter(&stub);

        let limit = wordpress.fetch_latest_posts(0).await.expect_err("zero limit");
        let term = wordpress.search_posts(" ", 5).await.expect_err("blank term");

        assert_eq!(limit.kind(), SourceErrorKind::InvalidRequest);
        assert_eq!(term.kind(), SourceErrorKind::InvalidRequest);
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn undecodable_body_is_malformed_and_not_cached() {
        let stub = StubHttpClient::new();
        stub.respond(HttpMethod::Get, "/posts", HttpResponse::ok_json("<html>"));
        let wordpress = adapter(&stub);

        let error = wordpress.latest_news_for_slider(3).await.expect_err("bad body");

        assert_eq!(error.kind(), SourceErrorKind::Malformed);
        assert!(wordpress.cache().is_empty().await);
    }

    #[tokio::test]
    async fn comment_submission_posts_wordpress_fields() {
        let stub = StubHttpClient::new();
        stub.respond(
            HttpMethod::Post,
            "/comments",
            HttpResponse::new(
                201,
                r#"{"id": 9, "post": 42, "author_name": "Ada", "author_url": "", "content": {"rendered": "<p>Nice</p>"}, "date_gmt": "2024-03-01T10:00:00"}"#,
            ),
        );
        let submission =
            CommentSubmission::new(42, "Ada", "ada@example.test", "Nice", None).expect("valid");

        let comment = adapter(&stub).submit_comment(&submission).await.expect("created");

        assert_eq!(comment.id, 9);
        assert_eq!(comment.content, "Nice");
        assert_eq!(comment.author_url, None);

        let request = stub.requests().pop().expect("recorded");
        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap_or_default()).expect("json body");
        assert_eq!(body["post"], 42);
        assert_eq!(body["author_email"], "ada@example.test");
        assert!(body.get("author_url").is_none());
    }
}
