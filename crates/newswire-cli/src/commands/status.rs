use newswire_core::{BackendId, NewsServiceManager, ServiceStatus};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct StatusResponseData {
    #[serde(flatten)]
    status: ServiceStatus,
    active_backend: Option<BackendId>,
}

/// Probes both backends, then reports which one the next call would use.
pub async fn run(manager: &NewsServiceManager) -> Result<Value, CliError> {
    manager.check_health().await;
    let active_backend = manager.active_backend().await.ok();

    Ok(serde_json::to_value(StatusResponseData {
        status: manager.service_status(),
        active_backend,
    })?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use newswire_core::{
        HttpMethod, HttpResponse, NewsServiceBuilder, ServiceConfig, StubHttpClient,
        SupabaseConfig, WordPressConfig,
    };

    use super::*;

    #[tokio::test]
    async fn reports_probe_results_and_selected_backend() {
        let stub = StubHttpClient::new();
        stub.respond(HttpMethod::Get, "/wp-json/wp/v2/posts", HttpResponse::ok_json("[]"));
        stub.respond(HttpMethod::Get, "/rest/v1/articles", HttpResponse::new(500, "{}"));
        let manager = NewsServiceBuilder::new(ServiceConfig {
            wordpress: Some(WordPressConfig {
                base_url: String::from("https://wp.example.test"),
            }),
            supabase: Some(SupabaseConfig {
                url: String::from("https://sb.example.test"),
                anon_key: String::from("anon"),
            }),
            ..ServiceConfig::default()
        })
        .with_http_client(Arc::new(stub.clone()))
        .build();

        let document = run(&manager).await.expect("status");

        assert_eq!(document["mode"], "auto");
        assert_eq!(document["health"]["wordpress"], true);
        assert_eq!(document["health"]["supabase"], false);
        assert_eq!(document["active_backend"], "wordpress");
        assert_eq!(stub.count("/rest/v1/articles"), 1);
    }
}
