use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Minimal HTTP method set needed by backend adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One outgoing call. Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_json_body(self, body: impl Into<String>) -> Self {
        let mut request = self.with_header("content-type", "application/json");
        request.body = Some(body.into());
        request
    }

    /// Supabase gateway key: sent as `apikey` and as the bearer token, which
    /// makes PostgREST run the query under the `anon` role.
    pub fn with_anon_key(self, key: &str) -> Self {
        self.with_header("apikey", key)
            .with_header("authorization", format!("Bearer {key}"))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Status and raw body; adapters decode the body themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The request never produced a response. `retryable` is false only when
/// the request itself could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Adapter transport contract.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

#[derive(Debug, Clone)]
struct StubRoute {
    method: HttpMethod,
    url_fragment: String,
    reply: Result<HttpResponse, HttpError>,
}

/// Scripted in-process transport for deterministic offline tests.
///
/// A request is answered by the most recently registered route whose method
/// matches and whose fragment occurs in the URL; unmatched requests get a
/// `404`. Every request is recorded.
#[derive(Debug, Default, Clone)]
pub struct StubHttpClient {
    routes: Arc<Mutex<Vec<StubRoute>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl StubHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers matching requests with `response`.
    pub fn respond(&self, method: HttpMethod, url_fragment: &str, response: HttpResponse) -> &Self {
        self.push_route(method, url_fragment, Ok(response));
        self
    }

    /// Answers matching requests with a transport error.
    pub fn fail(&self, method: HttpMethod, url_fragment: &str, error: HttpError) -> &Self {
        self.push_route(method, url_fragment, Err(error));
        self
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of recorded requests whose URL contains `url_fragment`.
    pub fn count(&self, url_fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|request| request.url.contains(url_fragment))
            .count()
    }

    fn push_route(
        &self,
        method: HttpMethod,
        url_fragment: &str,
        reply: Result<HttpResponse, HttpError>,
    ) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(StubRoute {
                method,
                url_fragment: url_fragment.to_owned(),
                reply,
            });
    }
}

impl HttpClient for StubHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let reply = self
                .routes
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .iter()
                .rev()
                .find(|route| {
                    route.method == request.method && request.url.contains(&route.url_fragment)
                })
                .map(|route| route.reply.clone());

            self.requests
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(request);

            reply.unwrap_or_else(|| Ok(HttpResponse::new(404, "{}")))
        })
    }
}

/// Network transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("newswire/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let HttpRequest {
                method,
                url,
                headers,
                body,
                timeout,
            } = request;

            let builder = headers.iter().fold(
                match method {
                    HttpMethod::Get => self.client.get(&url),
                    HttpMethod::Post => self.client.post(&url),
                }
                .timeout(timeout),
                |builder, (name, value)| builder.header(name, value),
            );
            let builder = match body {
                Some(body) => builder.body(body),
                None => builder,
            };

            let response = builder.send().await.map_err(send_error)?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|error| HttpError::new(format!("{url}: body read failed: {error}")))?;

            Ok(HttpResponse::new(status, body))
        })
    }
}

fn send_error(error: reqwest::Error) -> HttpError {
    if error.is_builder() {
        HttpError::non_retryable(format!("unbuildable request: {error}"))
    } else if error.is_timeout() {
        HttpError::new(format!("timed out: {error}"))
    } else {
        HttpError::new(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_key_sets_gateway_and_bearer_headers() {
        let request =
            HttpRequest::get("https://proj.supabase.test/rest/v1/articles").with_anon_key("demo");

        assert_eq!(request.headers.get("apikey").map(String::as_str), Some("demo"));
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer demo")
        );
    }

    #[test]
    fn plain_request_has_no_headers_and_default_timeout() {
        let request = HttpRequest::get("https://wp.example.test/")
            .with_header("Accept", "application/json")
            .with_timeout(Duration::from_millis(250));

        assert_eq!(request.headers.len(), 1);
        assert!(request.headers.contains_key("accept"));
        assert_eq!(request.timeout, Duration::from_millis(250));
        assert_eq!(
            HttpRequest::get("https://wp.example.test/").timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = HttpRequest::post("https://example.test/comments").with_json_body("{}");

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body.as_deref(), Some("{}"));
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn stub_prefers_latest_matching_route_and_records_requests() {
        let stub = StubHttpClient::new();
        stub.respond(HttpMethod::Get, "/posts", HttpResponse::ok_json("[1]"));
        stub.respond(HttpMethod::Get, "/posts", HttpResponse::ok_json("[2]"));

        let response = stub
            .execute(HttpRequest::get("https://example.test/posts?per_page=1"))
            .await
            .expect("stubbed");
        assert_eq!(response.body, "[2]");

        let missing = stub
            .execute(HttpRequest::get("https://example.test/unknown"))
            .await
            .expect("stubbed");
        assert_eq!(missing.status, 404);
        assert_eq!(stub.count("example.test"), 2);
    }
}
