use anyhow::anyhow;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};

use crate::error::ThumbError;
use crate::models::VideoMetadata;
use crate::text::sanitize_title;

/// Video metadata lookup seam; mocked in orchestrator tests.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn video_info(&self, videoid: &str) -> Result<VideoMetadata, ThumbError>;
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<SearchResult>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchResult {
    title: Option<String>,
    duration: Option<String>,
    thumbnails: Vec<SearchThumbnail>,
    #[serde(rename = "viewCount")]
    view_count: SearchViews,
    channel: SearchChannel,
}

#[derive(Deserialize)]
struct SearchThumbnail {
    url: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchViews {
    short: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchChannel {
    name: Option<String>,
}

// Absent fields fall back to named placeholders; a result without any
// thumbnail is unusable and rejected.
fn to_metadata(raw: SearchResult) -> Option<VideoMetadata> {
    let url = raw.thumbnails.into_iter().next()?.url;
    let thumbnail_url = url.split('?').next().unwrap_or_default().to_string();

    Some(VideoMetadata {
        title: sanitize_title(&raw.title.unwrap_or_else(|| "Unsupported Title".to_string())),
        duration: raw.duration.unwrap_or_else(|| "Unknown Mins".to_string()),
        thumbnail_url,
        views: raw
            .view_count
            .short
            .unwrap_or_else(|| "Unknown Views".to_string()),
        channel: raw
            .channel
            .name
            .unwrap_or_else(|| "Unknown Channel".to_string()),
    })
}

/// Fetches metadata from the search API, limit 1, keyed by the canonical
/// watch URL.
pub struct HttpVideoSearch {
    client: reqwest::Client,
    api_url: String,
}

impl HttpVideoSearch {
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    async fn query(&self, videoid: &str) -> anyhow::Result<VideoMetadata> {
        let watch_url = format!("https://www.youtube.com/watch?v={videoid}");

        let res = self
            .client
            .get(&self.api_url)
            .query(&[("q", watch_url.as_str()), ("limit", "1")])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(anyhow!("search failed with status: {}", res.status()));
        }

        let body: SearchResponse = res.json().await?;
        let first = body
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no search results for {watch_url}"))?;

        to_metadata(first).ok_or_else(|| anyhow!("search result for {watch_url} has no thumbnail"))
    }
}

#[async_trait]
impl VideoSearch for HttpVideoSearch {
    async fn video_info(&self, videoid: &str) -> Result<VideoMetadata, ThumbError> {
        match self.query(videoid).await {
            Ok(meta) => {
                info!("Fetched video info for '{videoid}': {}", meta.title);
                Ok(meta)
            }
            Err(e) => {
                error!("Error fetching video info for '{videoid}': {e:#}");
                Err(ThumbError::VideoInfo(e))
            }
        }
    }
}
