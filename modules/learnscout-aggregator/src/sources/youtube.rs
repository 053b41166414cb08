//! Playlist search via the YouTube Data API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use learnscout_common::{Resource, SourceKind};

use crate::error::{Result, SourceError};
use crate::sources::SourceAdapter;

const MAX_RESULTS: u32 = 10;

pub struct YoutubeAdapter {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    #[serde(rename = "playlistId")]
    playlist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl YoutubeAdapter {
    pub fn new(api_url: &str, api_key: Option<&str>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_url: api_url.to_string(),
            api_key: api_key.map(String::from),
        }
    }
}

/// Flatten API items into resources. Items without a playlist id (channel or
/// video hits) are skipped; the high-res thumbnail wins over the default one.
fn to_resources(query: &str, items: Vec<SearchItem>) -> Vec<Resource> {
    items
        .into_iter()
        .filter_map(|item| {
            let playlist_id = item.id.playlist_id?;
            let link = format!("https://www.youtube.com/playlist?list={playlist_id}");
            let mut resource = Resource::new(query, &item.snippet.title, &link);
            resource.description = item.snippet.description.filter(|d| !d.is_empty());
            resource.thumbnail_url = item
                .snippet
                .thumbnails
                .and_then(|t| t.high.or(t.default))
                .map(|t| t.url);
            if let Some(channel) = item.snippet.channel_title {
                resource = resource.with_extra("channel", channel);
            }
            Some(resource)
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for YoutubeAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Youtube
    }

    fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(6)
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Resource>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingApiKey("youtube"))?;

        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "playlist"),
                ("maxResults", &MAX_RESULTS.to_string()),
                ("key", key),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let data: SearchResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::MalformedResponse(e.to_string()))?;

        let resources = to_resources(query, data.items);
        info!(query, count = resources.len(), "YouTube playlist search complete");
        Ok(resources)
    }
}
