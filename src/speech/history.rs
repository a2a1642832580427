use super::{HistoryLister, build_http_client};
use crate::config::{SecretString, SpeechConfig};
use crate::error::Result;
use crate::types::HistorySnapshot;
use async_trait::async_trait;
use serde::Deserialize;

/// Reads the speech service's generation history
#[derive(Clone)]
pub struct SpeechHistoryClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

#[derive(Deserialize)]
struct HistoryPage {
    history: Vec<HistoryItem>,
}

#[derive(Deserialize)]
struct HistoryItem {
    history_item_id: Option<String>,
}

impl SpeechHistoryClient {
    /// Create a client from the speech configuration
    ///
    /// A missing API key is allowed; every listing is then empty.
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config.request_timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn fetch_page(&self, api_key: &SecretString) -> std::result::Result<HistoryPage, reqwest::Error> {
        self.http
            .get(format!("{}/v1/history", self.base_url))
            .header("xi-api-key", api_key.expose())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<HistoryPage>()
            .await
    }
}

#[async_trait]
impl HistoryLister for SpeechHistoryClient {
    async fn list_ids(&self) -> HistorySnapshot {
        let Some(api_key) = &self.api_key else {
            tracing::warn!("speech API key is not configured, history listing skipped");
            return HistorySnapshot::default();
        };

        match self.fetch_page(api_key).await {
            Ok(page) => {
                let snapshot: HistorySnapshot = page
                    .history
                    .into_iter()
                    .filter_map(|item| item.history_item_id)
                    .collect();
                tracing::debug!(items = snapshot.len(), "listed speech history");
                snapshot
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list speech history");
                HistorySnapshot::default()
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> SpeechHistoryClient {
        SpeechHistoryClient::new(&SpeechConfig {
            base_url: server.uri(),
            api_key: api_key.map(SecretString::new),
            ..SpeechConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn lists_ids_newest_first_skipping_items_without_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/history"))
            .and(header("xi-api-key", "xi-test"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "history": [
                    { "history_item_id": "c", "text": "newest" },
                    { "text": "no id" },
                    { "history_item_id": "b" },
                    { "history_item_id": "a" }
                ],
                "has_more": false
            })))
            .mount(&server)
            .await;

        let snapshot = client_for(&server, Some("xi-test")).list_ids().await;
        assert_eq!(snapshot.ids(), ["c", "b", "a"]);
    }

    #[tokio::test]
    async fn missing_api_key_lists_nothing_without_calling_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(client_for(&server, None).list_ids().await.is_empty());
    }

    #[tokio::test]
    async fn http_failure_lists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/history"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        assert!(client_for(&server, Some("bad")).list_ids().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_lists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/history"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        assert!(client_for(&server, Some("xi-test")).list_ids().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_service_lists_nothing() {
        let config = SpeechConfig {
            base_url: "http://127.0.0.1:9".into(),
            api_key: Some(SecretString::new("xi-test")),
            ..SpeechConfig::default()
        };
        let client = SpeechHistoryClient::new(&config).unwrap();
        assert!(client.list_ids().await.is_empty());
    }
}
