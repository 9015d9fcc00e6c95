//! Scripted in-memory [`NewsSource`] for exercising selection, failover and
//! health checks without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::news_source::{NewsSource, Operation, SourceError, SourceFuture};
use crate::{BackendId, Comment, CommentSubmission, FormattedArticle, UtcDateTime};

/// Answers every operation with canned data tagged with its backend name, or
/// with a scripted failure. Counts calls per operation and probes.
#[derive(Debug)]
pub struct ScriptedSource {
    id: BackendId,
    failing: AtomicBool,
    probe_healthy: AtomicBool,
    probe_delay: Mutex<Option<Duration>>,
    probes: AtomicUsize,
    calls: Mutex<HashMap<Operation, usize>>,
}

impl ScriptedSource {
    pub fn new(id: BackendId) -> Self {
        Self {
            id,
            failing: AtomicBool::new(false),
            probe_healthy: AtomicBool::new(true),
            probe_delay: Mutex::new(None),
            probes: AtomicUsize::new(0),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// A source whose operations always fail (probes still follow
    /// [`set_probe_healthy`](Self::set_probe_healthy)).
    pub fn failing(id: BackendId) -> Self {
        let source = Self::new(id);
        source.set_failing(true);
        source
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_probe_healthy(&self, healthy: bool) {
        self.probe_healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_probe_delay(&self, delay: Option<Duration>) {
        *self.probe_delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Calls made for one operation.
    pub fn calls(&self, operation: Operation) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Calls made across all operations, probes excluded.
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .sum()
    }

    /// The error every failing operation returns.
    pub fn scripted_error(&self) -> SourceError {
        SourceError::unavailable(format!("{} scripted failure", self.id))
    }

    /// Title of the canned article with `id`.
    pub fn headline(backend: BackendId, id: u64) -> String {
        format!("{backend} story {id}")
    }

    fn record(&self, operation: Operation) -> Result<(), SourceError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(operation)
            .or_insert(0) += 1;

        if self.failing.load(Ordering::SeqCst) {
            Err(self.scripted_error())
        } else {
            Ok(())
        }
    }

    fn article(&self, id: u64) -> FormattedArticle {
        FormattedArticle {
            id,
            title: Self::headline(self.id, id),
            date: UtcDateTime::now(),
            excerpt: format!("served by {}", self.id),
            image: None,
            category: String::from("News"),
            slug: format!("{}-story-{id}", self.id),
            link: format!("https://{}.example.test/{id}", self.id),
            content: None,
            author: None,
            comment_count: None,
        }
    }

    fn articles(&self, limit: usize) -> Vec<FormattedArticle> {
        (1..=limit as u64).map(|id| self.article(id)).collect()
    }

    fn comment(&self, id: u64, post_id: u64, author: &str, content: &str) -> Comment {
        Comment {
            id,
            post_id,
            author_name: author.to_owned(),
            author_url: None,
            content: content.to_owned(),
            date: UtcDateTime::now(),
        }
    }
}

impl NewsSource for ScriptedSource {
    fn id(&self) -> BackendId {
        self.id
    }

    fn probe<'a>(&'a self) -> SourceFuture<'a, ()> {
        Box::pin(async move {
            self.probes.fetch_add(1, Ordering::SeqCst);
            let delay = *self.probe_delay.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.probe_healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(SourceError::unavailable(format!("{} probe failed", self.id)))
            }
        })
    }

    fn latest_news_for_slider<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            self.record(Operation::LatestForSlider)?;
            Ok(self.articles(limit))
        })
    }

    fn latest_news_by_category_id<'a>(
        &'a self,
        category_id: u64,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            self.record(Operation::ByCategoryId)?;
            let mut articles = self.articles(limit);
            for article in &mut articles {
                article.category = format!("category {category_id}");
            }
            Ok(articles)
        })
    }

    fn latest_news_by_category<'a>(
        &'a self,
        slug: &'a str,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            self.record(Operation::ByCategorySlug)?;
            let mut articles = self.articles(limit);
            for article in &mut articles {
                article.category = slug.to_owned();
            }
            Ok(articles)
        })
    }

    fn search_posts<'a>(
        &'a self,
        term: &'a str,
        limit: usize,
    ) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            self.record(Operation::Search)?;
            let mut articles = self.articles(limit);
            for article in &mut articles {
                article.excerpt = format!("matches {term}");
            }
            Ok(articles)
        })
    }

    fn post_by_id<'a>(&'a self, id: u64) -> SourceFuture<'a, Option<FormattedArticle>> {
        Box::pin(async move {
            self.record(Operation::PostById)?;
            Ok(Some(self.article(id)))
        })
    }

    fn fetch_latest_posts<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<FormattedArticle>> {
        Box::pin(async move {
            self.record(Operation::LatestPosts)?;
            let mut articles = self.articles(limit);
            for article in &mut articles {
                article.content = Some(format!("<p>{}</p>", article.title));
            }
            Ok(articles)
        })
    }

    fn fetch_comments_by_post_id<'a>(&'a self, post_id: u64) -> SourceFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            self.record(Operation::CommentsByPost)?;
            Ok(vec![self.comment(1, post_id, "Reader", "First!")])
        })
    }

    fn fetch_recent_comments<'a>(&'a self, limit: usize) -> SourceFuture<'a, Vec<Comment>> {
        Box::pin(async move {
            self.record(Operation::RecentComments)?;
            Ok((1..=limit as u64)
                .map(|id| self.comment(id, id, "Reader", "Recent"))
                .collect())
        })
    }

    fn submit_comment<'a>(&'a self, submission: &'a CommentSubmission) -> SourceFuture<'a, Comment> {
        Box::pin(async move {
            self.record(Operation::SubmitComment)?;
            Ok(self.comment(
                99,
                submission.post_id,
                &submission.name,
                &submission.content,
            ))
        })
    }
}
