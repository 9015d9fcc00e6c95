mod supabase;
mod wordpress;

pub use supabase::SupabaseAdapter;
pub use wordpress::WordPressAdapter;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::CacheStore;
use crate::http_client::{HttpClient, HttpError, HttpRequest};
use crate::news_source::{Operation, SourceError};
use crate::BackendId;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP plumbing shared by both adapters: per-request timeout, status
/// mapping, JSON decoding and the response cache.
#[derive(Clone)]
struct RestClient {
    backend: BackendId,
    http_client: Arc<dyn HttpClient>,
    cache: CacheStore<String>,
    timeout: Duration,
}

impl RestClient {
    fn new(backend: BackendId, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            backend,
            http_client,
            cache: CacheStore::with_default_ttl(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Sends `request` uncached and returns the body of a 2xx response.
    async fn send(&self, request: HttpRequest) -> Result<String, SourceError> {
        let request = request.with_timeout(self.timeout);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|error| transport_error(self.backend, &error))?;

        if !response.is_success() {
            return Err(status_error(self.backend, response.status));
        }

        Ok(response.body)
    }

    /// Sends `request` uncached and decodes the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, SourceError> {
        let body = self.send(request).await?;
        decode(self.backend, &body)
    }

    /// Decodes the body cached under `key`, or fetches it and caches it once
    /// it decodes.
    async fn get_json<T: DeserializeOwned>(
        &self,
        key: String,
        request: HttpRequest,
    ) -> Result<T, SourceError> {
        if let Some(body) = self.cache.get(&key).await {
            debug!(backend = self.backend.as_str(), cache_key = %key, "cache hit");
            return decode(self.backend, &body);
        }

        let body = self.send(request).await?;
        let value = decode(self.backend, &body)?;
        self.cache.put(key, body, None).await;
        Ok(value)
    }

    /// Drops cached comment reads after a successful submission.
    async fn invalidate_comments(&self, post_id: u64) {
        self.cache.delete(&post_comments_key(post_id)).await;
        self.cache
            .delete_prefix(&cache_key(Operation::RecentComments, ""))
            .await;
    }
}

fn cache_key(operation: Operation, params: &str) -> String {
    format!("{}:{params}", operation.as_str())
}

fn post_comments_key(post_id: u64) -> String {
    cache_key(Operation::CommentsByPost, &format!("post={post_id}"))
}

fn decode<T: DeserializeOwned>(backend: BackendId, body: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|error| {
        SourceError::malformed(format!("{backend} returned an undecodable body: {error}"))
    })
}

fn transport_error(backend: BackendId, error: &HttpError) -> SourceError {
    if error.retryable() {
        SourceError::unavailable(format!("{backend} transport error: {}", error.message()))
    } else {
        SourceError::internal(format!("{backend} transport error: {}", error.message()))
    }
}

fn status_error(backend: BackendId, status: u16) -> SourceError {
    let message = format!("{backend} returned status {status}");
    match status {
        429 => SourceError::rate_limited(message),
        408 => SourceError::unavailable(message),
        400..=499 => SourceError::invalid_request(message),
        _ => SourceError::unavailable(message),
    }
}

fn ensure_limit(backend: BackendId, limit: usize) -> Result<(), SourceError> {
    if limit == 0 {
        return Err(SourceError::invalid_request(format!(
            "{backend} request limit must be greater than zero"
        )));
    }
    Ok(())
}

fn ensure_search_term(backend: BackendId, term: &str) -> Result<&str, SourceError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(SourceError::invalid_request(format!(
            "{backend} search term cannot be blank"
        )));
    }
    Ok(term)
}

/// Reduces rendered HTML to plain text: tags removed, entities decoded,
/// whitespace collapsed.
fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag: Option<String> = None;

    for ch in html.chars() {
        if let Some(name) = tag.as_mut() {
            if ch == '>' {
                if is_block_tag(name) {
                    text.push(' ');
                }
                tag = None;
            } else {
                name.push(ch);
            }
        } else if ch == '<' {
            tag = Some(String::new());
        } else {
            text.push(ch);
        }
    }

    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_block_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(
        name.as_str(),
        "p" | "br" | "div" | "li" | "ul" | "ol" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5"
            | "h6"
    )
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            return char::from_u32(code);
        }
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_text_strips_tags_and_decodes_entities() {
        assert_eq!(
            html_to_text("<p>Rates &amp; bonds <strong>rally</strong>&#8230;</p>\n<p>Next&nbsp;up</p>"),
            "Rates & bonds rally\u{2026} Next up"
        );
        assert_eq!(html_to_text("It&#8217;s <a href=\"/x\">here</a>!"), "It\u{2019}s here!");
        assert_eq!(html_to_text("Fish &chips; & more"), "Fish &chips; & more");
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        use crate::news_source::SourceErrorKind;

        let kind = |status| status_error(BackendId::WordPress, status).kind();
        assert_eq!(kind(503), SourceErrorKind::Unavailable);
        assert_eq!(kind(408), SourceErrorKind::Unavailable);
        assert_eq!(kind(429), SourceErrorKind::RateLimited);
        assert_eq!(kind(400), SourceErrorKind::InvalidRequest);
        assert_eq!(kind(404), SourceErrorKind::InvalidRequest);
    }

    #[test]
    fn input_checks_reject_empty_values() {
        assert!(ensure_limit(BackendId::Supabase, 0).is_err());
        assert!(ensure_limit(BackendId::Supabase, 1).is_ok());
        assert_eq!(ensure_search_term(BackendId::Supabase, "  vote "), Ok("vote"));
        assert!(ensure_search_term(BackendId::Supabase, "   ").is_err());
    }
}
