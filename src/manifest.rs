use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};

pub const MANIFEST_URL: &str = "https://catalog.streamgrid.app/tv-catalog.json";

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub endpoint: Option<String>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "backgroundImage")]
    pub background_image: String,
    pub banners: Vec<String>,
    pub videos: Vec<VideoEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub title: String,
    pub thumbnail: String,
    #[serde(rename = "streamURL")]
    pub stream_url: String,
}

impl VideoEntry {
    // Stable across reloads so list diffing survives a manifest refresh;
    // only meaningful within one rendered list.
    pub fn key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.title.hash(&mut hasher);
        self.stream_url.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("network request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("manifest did not decode: {0}")]
    Decode(#[source] serde_json::Error),
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    endpoint: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("manifest client user agent required");
        }

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(Duration::from_secs(20))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            endpoint: config.endpoint.unwrap_or_else(|| MANIFEST_URL.to_string()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn fetch(&self) -> Result<Manifest, LoadError> {
        let response = self
            .http
            .get(&self.endpoint)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(LoadError::Network)?;
        let body = response.text().map_err(LoadError::Network)?;
        serde_json::from_str(&body).map_err(LoadError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "backgroundImage": "https://cdn.test/bg.jpg",
        "banners": ["https://cdn.test/b1.jpg", "https://cdn.test/b2.jpg"],
        "videos": [
            {"title": "First", "thumbnail": "https://cdn.test/t1.jpg", "streamURL": "https://cdn.test/v1.mp4"},
            {"title": "Second", "thumbnail": "https://cdn.test/t2.jpg", "streamURL": "https://cdn.test/v2.mp4"},
            {"title": "Third", "thumbnail": "https://cdn.test/t3.jpg", "streamURL": "https://cdn.test/v3.mp4"}
        ]
    }"#;

    #[test]
    fn decode_preserves_source_order() {
        let manifest: Manifest = serde_json::from_str(WELL_FORMED).unwrap();
        let titles: Vec<&str> = manifest
            .videos
            .iter()
            .map(|video| video.title.as_str())
            .collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
        assert_eq!(
            manifest.banners,
            ["https://cdn.test/b1.jpg", "https://cdn.test/b2.jpg"]
        );
    }

    #[test]
    fn decode_rejects_missing_videos() {
        let body = r#"{"backgroundImage": "https://cdn.test/bg.jpg", "banners": []}"#;
        assert!(serde_json::from_str::<Manifest>(body).is_err());
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let body = r#"{
            "backgroundImage": "https://cdn.test/bg.jpg",
            "banners": [],
            "videos": [],
            "schemaVersion": 4,
            "promoted": {"campaign": "ignored"}
        }"#;
        let manifest: Manifest = serde_json::from_str(body).unwrap();
        assert!(manifest.videos.is_empty());
        assert!(manifest.banners.is_empty());
    }

    #[test]
    fn empty_lists_decode() {
        let body = r#"{"backgroundImage": "", "banners": [], "videos": []}"#;
        let manifest: Manifest = serde_json::from_str(body).unwrap();
        assert!(manifest.banners.is_empty());
        assert!(manifest.videos.is_empty());
    }

    #[test]
    fn keys_are_stable_across_instances() {
        let first: Manifest = serde_json::from_str(WELL_FORMED).unwrap();
        let second: Manifest = serde_json::from_str(WELL_FORMED).unwrap();
        assert_eq!(first.videos[0].key(), second.videos[0].key());
        assert_ne!(first.videos[0].key(), first.videos[1].key());
    }

    #[test]
    fn client_requires_user_agent() {
        assert!(Client::new(ClientConfig::default()).is_err());
    }

    #[test]
    fn client_defaults_to_compiled_endpoint() {
        let client = Client::new(ClientConfig {
            user_agent: "test/0.1".into(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(client.endpoint(), MANIFEST_URL);
    }
}
