//! Concurrent channel -> viewers lookup.

use crate::client::TwitchClient;
use crate::error::{Result, TwitchError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Viewers of each channel, in the order the channels were inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerMap {
    entries: Vec<(String, Vec<String>)>,
    /// Position of each channel in `entries`.
    index: HashMap<String, usize>,
}

impl ViewerMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the viewers of `channel`.
    ///
    /// A channel that is already present keeps its position and has its
    /// viewers replaced.
    pub fn insert(&mut self, channel: impl Into<String>, viewers: Vec<String>) {
        let channel = channel.into();
        match self.index.get(&channel) {
            Some(&position) => self.entries[position].1 = viewers,
            None => {
                self.index.insert(channel.clone(), self.entries.len());
                self.entries.push((channel, viewers));
            }
        }
    }

    /// Viewers of `channel`, if its lookup succeeded.
    pub fn get(&self, channel: &str) -> Option<&[String]> {
        self.index
            .get(channel)
            .map(|&position| self.entries[position].1.as_slice())
    }

    /// Whether `channel` has an entry.
    pub fn contains(&self, channel: &str) -> bool {
        self.get(channel).is_some()
    }

    /// Number of channels in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no channels.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Channels in insertion order.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// `(channel, viewers)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, viewers)| (name.as_str(), viewers.as_slice()))
    }

    /// Sum of the viewer list lengths.
    pub fn total_viewers(&self) -> usize {
        self.entries.iter().map(|(_, viewers)| viewers.len()).sum()
    }
}

impl Serialize for ViewerMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (channel, viewers) in &self.entries {
            map.serialize_entry(channel, viewers)?;
        }
        map.end()
    }
}

impl IntoIterator for ViewerMap {
    type Item = (String, Vec<String>);
    type IntoIter = std::vec::IntoIter<(String, Vec<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl TwitchClient {
    /// Look up the current viewers of every channel in `streamers` at once.
    ///
    /// All lookups run concurrently with no limit. A channel whose lookup
    /// fails is logged and left out of the map; it never fails the call or
    /// the other lookups. Entries appear in completion order.
    pub async fn get_viewer_map<S: AsRef<str>>(&self, streamers: &[S]) -> ViewerMap {
        info!(streamers = streamers.len(), "Gathering a viewer map");

        let mut viewer_map = ViewerMap::new();
        let mut lookups = stream::iter(streamers)
            .map(|streamer| async move {
                let channel = streamer.as_ref();
                (channel, self.get_current_viewers(channel).await)
            })
            .buffer_unordered(streamers.len().max(1));

        let mut failed = 0usize;
        while let Some((channel, outcome)) = lookups.next().await {
            match outcome {
                Ok(viewers) => viewer_map.insert(channel, viewers),
                Err(e) => {
                    failed += 1;
                    warn!(channel, error = %e, "Failed to get viewers, skipping channel");
                }
            }
        }

        info!(
            channels = viewer_map.len(),
            failed,
            "Finished gathering the viewer map"
        );

        viewer_map
    }
}

/// Result of one run: the streamers looked up and their viewers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ViewerReport {
    /// When the lookup finished.
    pub fetched_at: DateTime<Utc>,
    /// Channels that were looked up, in request order.
    pub streamers: Vec<String>,
    /// Viewers of every channel whose lookup succeeded.
    pub viewers: ViewerMap,
}

impl ViewerReport {
    /// Create a report stamped with the current time.
    pub fn new(streamers: Vec<String>, viewers: ViewerMap) -> Self {
        Self {
            fetched_at: Utc::now(),
            streamers,
            viewers,
        }
    }

    /// Channels that were requested but have no entry.
    pub fn missing(&self) -> Vec<&str> {
        self.streamers
            .iter()
            .map(String::as_str)
            .filter(|s| !self.viewers.contains(s))
            .collect()
    }

    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON to `path`.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let map_err = |e: std::io::Error| TwitchError::OutputFileWrite {
            path: path.to_path_buf(),
            source: e,
        };

        let mut file = tokio::fs::File::create(path).await.map_err(map_err)?;
        file.write_all(json.as_bytes()).await.map_err(map_err)?;
        file.write_all(b"\n").await.map_err(map_err)?;
        file.flush().await.map_err(map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TwitchClient {
        TwitchClient::new(ApiConfig {
            tmi_base_url: server.uri(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    async fn mount_chatters(server: &MockServer, channel: &str, viewers: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/group/user/{channel}/chatters")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"chatters": {"viewers": viewers}})),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut map = ViewerMap::new();
        map.insert("a", vec!["x".to_string()]);
        map.insert("b", vec![]);
        map.insert("a", vec!["y".to_string(), "z".to_string()]);

        assert_eq!(map.channels().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(map.get("a"), Some(&["y".to_string(), "z".to_string()][..]));
        assert_eq!(map.total_viewers(), 2);
        assert!(map.get("c").is_none());
    }

    #[test]
    fn test_lookup_after_many_inserts() {
        let mut map = ViewerMap::new();
        for i in 0..1000 {
            map.insert(format!("channel{i}"), vec![i.to_string()]);
        }
        map.insert("channel500", vec!["replaced".to_string()]);

        assert_eq!(map.len(), 1000);
        assert_eq!(map.get("channel500"), Some(&["replaced".to_string()][..]));
        assert_eq!(map.channels().nth(500), Some("channel500"));
        assert_eq!(map.get("channel999"), Some(&["999".to_string()][..]));
    }

    #[tokio::test]
    async fn test_duplicate_input_channels() {
        let server = MockServer::start().await;
        mount_chatters(&server, "dup", &["a"]).await;

        let map = client(&server).get_viewer_map(&["dup", "dup", "dup"]).await;

        assert_eq!(map.len(), 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_failures_counted_per_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let client = client(&server);
        let map = client.get_viewer_map(&["dup", "dup", "other"]).await;

        assert!(map.is_empty());
        assert_eq!(client.stats().chatters.failure_count, 3);
    }

    #[test]
    fn test_serializes_as_object() {
        let mut map = ViewerMap::new();
        map.insert("b", vec!["1".to_string()]);
        map.insert("a", vec!["2".to_string()]);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"b":["1"],"a":["2"]}"#);
    }

    #[tokio::test]
    async fn test_failed_channel_is_skipped() {
        let server = MockServer::start().await;
        mount_chatters(&server, "ch1", &["a", "b"]).await;
        Mock::given(method("GET"))
            .and(path("/group/user/ch2/chatters"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let map = client(&server).get_viewer_map(&["ch1", "ch2"]).await;

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("ch1"), Some(&["a".to_string(), "b".to_string()][..]));
        assert!(!map.contains("ch2"));
    }

    #[tokio::test]
    async fn test_lookups_run_concurrently() {
        let server = MockServer::start().await;
        for channel in ["slow1", "slow2", "slow3", "slow4"] {
            Mock::given(method("GET"))
                .and(path(format!("/group/user/{channel}/chatters")))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"chatters": {"viewers": [channel]}}))
                        .set_delay(Duration::from_millis(300)),
                )
                .mount(&server)
                .await;
        }

        let started = std::time::Instant::now();
        let map = client(&server)
            .get_viewer_map(&["slow1", "slow2", "slow3", "slow4"])
            .await;

        assert_eq!(map.len(), 4);
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_keys_keep_caller_spelling() {
        let server = MockServer::start().await;
        mount_chatters(&server, "mixedcase", &["v"]).await;

        let channels = vec!["MixedCase".to_string()];
        let map = client(&server).get_viewer_map(&channels).await;

        assert!(map.contains("MixedCase"));
        assert!(!map.contains("mixedcase"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let server = MockServer::start().await;
        let empty: [&str; 0] = [];

        let map = client(&server).get_viewer_map(&empty).await;

        assert!(map.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_file() {
        let mut viewers = ViewerMap::new();
        viewers.insert("ch1", vec!["a".to_string()]);
        let report = ViewerReport::new(vec!["ch1".to_string(), "ch2".to_string()], viewers);

        assert_eq!(report.missing(), vec!["ch2"]);

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.json");
        report.write_to(&file).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(written["viewers"]["ch1"][0], "a");
        assert_eq!(written["streamers"][1], "ch2");
        assert!(written["fetched_at"].is_string());
    }
}
