//! HTTP session shared by every Twitch operation.
//!
//! [`TwitchClient`] wraps a pooled `reqwest::Client` together with the
//! endpoint configuration and a request [`StatsTracker`]. It is cheap to
//! clone; clones share the connection pool and the statistics.

use crate::config::ApiConfig;
use crate::error::{Result, TwitchError};
use crate::tracker::{RequestKind, StatsSnapshot, StatsTracker};
use reqwest::{header, Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// HTTP client for the Helix and TMI endpoints.
#[derive(Debug, Clone)]
pub struct TwitchClient {
    client: Client,
    config: Arc<ApiConfig>,
    stats: Arc<StatsTracker>,
}

impl TwitchClient {
    /// Create a new client.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(TwitchError::HttpRequest)?;

        Ok(Self::with_client(client, config))
    }

    /// Wrap an already configured `reqwest::Client`.
    pub fn with_client(client: Client, config: ApiConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
            stats: Arc::new(StatsTracker::new()),
        }
    }

    /// Endpoint configuration this client was built with.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Statistics for every request issued through this client and its clones.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn streams_url(&self) -> String {
        format!("{}/streams", self.config.helix_base_url.trim_end_matches('/'))
    }

    pub(crate) fn chatters_url(&self, channel: &str) -> String {
        format!(
            "{}/group/user/{}/chatters",
            self.config.tmi_base_url.trim_end_matches('/'),
            channel
        )
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send a request and decode its body as JSON.
    ///
    /// The HTTP status is not inspected: both endpoints signal errors in the
    /// body, and callers decide what a given body means.
    pub(crate) async fn send_json(
        &self,
        kind: RequestKind,
        request: RequestBuilder,
    ) -> Result<Value> {
        let start = Instant::now();
        trace!(endpoint = %kind, "Sending request");

        let outcome = async {
            let response = request.send().await?;
            let status = response.status();
            let body: Value = response.json().await?;
            trace!(endpoint = %kind, status = status.as_u16(), "Received response");
            Ok::<_, TwitchError>(body)
        }
        .await;

        match &outcome {
            Ok(_) => self.stats.record_success(kind, start.elapsed()),
            Err(_) => self.stats.record_failure(kind),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> ApiConfig {
        ApiConfig {
            helix_base_url: format!("{base}/helix/"),
            tmi_base_url: base.to_string(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_urls() {
        let client = TwitchClient::new(test_config("http://localhost:1")).unwrap();

        assert_eq!(client.streams_url(), "http://localhost:1/helix/streams");
        assert_eq!(
            client.chatters_url("somechannel"),
            "http://localhost:1/group/user/somechannel/chatters"
        );
    }

    #[tokio::test]
    async fn test_send_json_records_stats() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": 1})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = TwitchClient::new(test_config(&server.uri())).unwrap();

        let ok_url = format!("{}/ok", server.uri());
        let body = client
            .send_json(RequestKind::Chatters, client.get(&ok_url))
            .await
            .unwrap();
        assert_eq!(body["a"], 1);

        let broken_url = format!("{}/broken", server.uri());
        let result = client
            .send_json(RequestKind::Chatters, client.get(&broken_url))
            .await;
        assert!(matches!(result, Err(TwitchError::HttpRequest(_))));

        let snapshot = client.clone().stats();
        assert_eq!(snapshot.chatters.success_count, 1);
        assert_eq!(snapshot.chatters.failure_count, 1);
        assert_eq!(snapshot.streams.requests(), 0);
    }
}
