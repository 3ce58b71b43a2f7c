use anyhow::anyhow;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{error, info};

use crate::cache::temp_path;
use crate::error::ThumbError;

/// Source image download seam; mocked in orchestrator tests.
#[async_trait]
pub trait ThumbDownloader: Send + Sync {
    async fn download(&self, videoid: &str, url: &str) -> Result<PathBuf, ThumbError>;
}

/// Downloads the remote thumbnail into the cache directory's temp slot.
pub struct HttpDownloader {
    client: reqwest::Client,
    cache_dir: PathBuf,
}

impl HttpDownloader {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache_dir,
        }
    }

    async fn fetch(&self, videoid: &str, url: &str) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(anyhow!("download failed with status: {}", res.status()));
        }

        let file_path = temp_path(&self.cache_dir, videoid);
        let content = res.bytes().await?;
        tokio::fs::write(&file_path, &content).await?;

        info!(
            "Thumbnail for '{videoid}' downloaded to {}",
            file_path.display()
        );
        Ok(file_path)
    }
}

#[async_trait]
impl ThumbDownloader for HttpDownloader {
    async fn download(&self, videoid: &str, url: &str) -> Result<PathBuf, ThumbError> {
        self.fetch(videoid, url).await.map_err(|e| {
            error!("Error downloading thumbnail for '{videoid}': {e:#}");
            ThumbError::Download(e)
        })
    }
}
