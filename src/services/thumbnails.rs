use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::cache::{self, final_path};
use crate::config::Config;
use crate::error::ThumbError;
use crate::services::compose::{ImageCompositor, ThumbCompositor};
use crate::services::download::{HttpDownloader, ThumbDownloader};
use crate::services::search::{HttpVideoSearch, VideoSearch};

/// Entry point of the thumbnail pipeline and its single error boundary.
///
/// Every stage error is converted into the fallback URL here; callers never
/// see a failure.
pub struct ThumbnailService {
    config: Config,
    search: Arc<dyn VideoSearch>,
    downloader: Arc<dyn ThumbDownloader>,
    compositor: Arc<dyn ThumbCompositor>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThumbnailService {
    pub fn new(config: Config) -> Self {
        let search = Arc::new(HttpVideoSearch::new(config.search_api_url.clone()));
        let downloader = Arc::new(HttpDownloader::new(config.cache_dir.clone()));
        let compositor = Arc::new(ImageCompositor::new(&config));
        Self::with_collaborators(config, search, downloader, compositor)
    }

    pub fn with_collaborators(
        config: Config,
        search: Arc<dyn VideoSearch>,
        downloader: Arc<dyn ThumbDownloader>,
        compositor: Arc<dyn ThumbCompositor>,
    ) -> Self {
        Self {
            config,
            search,
            downloader,
            compositor,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a filesystem path to the banner for `videoid`, rendering and
    /// caching it on a miss, or the fallback URL when any stage fails.
    pub async fn get_thumb(&self, videoid: &str) -> String {
        if let Err(e) = tokio::fs::create_dir_all(&self.config.cache_dir).await {
            error!("Failed to create cache directory: {e}");
            return self.config.fallback_url.clone();
        }

        let cached = final_path(&self.config.cache_dir, videoid);
        if cache::is_cache_valid(&cached, self.config.cache_ttl) {
            return cached.display().to_string();
        }

        // Coalesce concurrent requests for the same id: whoever holds the
        // key lock renders, everyone else re-checks the cache afterwards.
        let key_lock = {
            let mut inflight = self.inflight.lock().await;
            inflight.entry(videoid.to_string()).or_default().clone()
        };
        let _guard = key_lock.lock().await;

        let result = if cache::is_cache_valid(&cached, self.config.cache_ttl) {
            cached.display().to_string()
        } else {
            match self.render(videoid).await {
                Ok(path) => path,
                Err(e) => {
                    error!("Thumbnail pipeline failed for '{videoid}': {e}");
                    self.config.fallback_url.clone()
                }
            }
        };

        self.inflight.lock().await.remove(videoid);
        result
    }

    async fn render(&self, videoid: &str) -> Result<String, ThumbError> {
        info!("Rendering thumbnail for '{videoid}'");

        let meta = self.search.video_info(videoid).await?;
        let temp = self.downloader.download(videoid, &meta.thumbnail_url).await?;
        let final_path = self.compositor.compose(videoid, &meta).await?;

        // Best-effort temp cleanup; a leftover temp file is not a failure
        if let Err(e) = tokio::fs::remove_file(&temp).await {
            error!("Error removing temporary thumbnail {}: {e}", temp.display());
        }

        Ok(final_path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::temp_path;
    use crate::models::VideoMetadata;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const FALLBACK: &str = "https://example.com/default.png";

    fn test_config(dir: &Path) -> Config {
        Config {
            cache_dir: dir.to_path_buf(),
            cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            fallback_url: FALLBACK.to_string(),
            search_api_url: "http://127.0.0.1:0/search".to_string(),
            font_path: PathBuf::from("assets/font.ttf"),
            font2_path: PathBuf::from("assets/font2.ttf"),
            branding: "TEST".to_string(),
        }
    }

    fn sample_meta() -> VideoMetadata {
        VideoMetadata {
            title: "Test Song".to_string(),
            duration: "3:45".to_string(),
            thumbnail_url: "http://x/img.png".to_string(),
            views: "1.2M".to_string(),
            channel: "Test Channel".to_string(),
        }
    }

    #[derive(Default)]
    struct MockSearch {
        calls: AtomicUsize,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl VideoSearch for MockSearch {
        async fn video_info(&self, _videoid: &str) -> Result<VideoMetadata, ThumbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                Err(ThumbError::VideoInfo(anyhow!("no results")))
            } else {
                Ok(sample_meta())
            }
        }
    }

    struct MockDownloader {
        calls: AtomicUsize,
        fail: bool,
        dir: PathBuf,
    }

    #[async_trait]
    impl ThumbDownloader for MockDownloader {
        async fn download(&self, videoid: &str, _url: &str) -> Result<PathBuf, ThumbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ThumbError::Download(anyhow!("status 404")));
            }
            let path = temp_path(&self.dir, videoid);
            std::fs::write(&path, b"raw").unwrap();
            Ok(path)
        }
    }

    struct MockCompositor {
        calls: AtomicUsize,
        dir: PathBuf,
    }

    #[async_trait]
    impl ThumbCompositor for MockCompositor {
        async fn compose(
            &self,
            videoid: &str,
            _meta: &VideoMetadata,
        ) -> Result<PathBuf, ThumbError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let path = final_path(&self.dir, videoid);
            std::fs::write(&path, b"png").unwrap();
            Ok(path)
        }
    }

    struct Harness {
        service: ThumbnailService,
        search: Arc<MockSearch>,
        downloader: Arc<MockDownloader>,
        compositor: Arc<MockCompositor>,
    }

    fn harness(dir: &Path, search: MockSearch, download_fails: bool) -> Harness {
        // Route pipeline logs through the test writer; first caller wins
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let search = Arc::new(search);
        let downloader = Arc::new(MockDownloader {
            calls: AtomicUsize::new(0),
            fail: download_fails,
            dir: dir.to_path_buf(),
        });
        let compositor = Arc::new(MockCompositor {
            calls: AtomicUsize::new(0),
            dir: dir.to_path_buf(),
        });
        let service = ThumbnailService::with_collaborators(
            test_config(dir),
            search.clone(),
            downloader.clone(),
            compositor.clone(),
        );
        Harness {
            service,
            search,
            downloader,
            compositor,
        }
    }

    #[tokio::test]
    async fn cache_hit_skips_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(final_path(dir.path(), "abc"), b"png").unwrap();

        let h = harness(dir.path(), MockSearch::default(), false);
        let result = h.service.get_thumb("abc").await;

        assert_eq!(result, final_path(dir.path(), "abc").display().to_string());
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.compositor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cache_miss_renders_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), MockSearch::default(), false);

        let result = h.service.get_thumb("abc").await;

        assert_eq!(result, final_path(dir.path(), "abc").display().to_string());
        assert!(final_path(dir.path(), "abc").exists());
        assert!(!temp_path(dir.path(), "abc").exists(), "temp not removed");
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.compositor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let search = MockSearch {
            fail: true,
            ..MockSearch::default()
        };
        let h = harness(dir.path(), search, false);

        let result = h.service.get_thumb("abc").await;

        assert_eq!(result, FALLBACK);
        assert_eq!(h.downloader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.compositor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn download_failure_skips_compositing() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(dir.path(), MockSearch::default(), true);

        let result = h.service.get_thumb("abc").await;

        assert_eq!(result, FALLBACK);
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.compositor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_cache_entry_is_rerendered() {
        let dir = tempfile::tempdir().unwrap();
        let cached = final_path(dir.path(), "abc");
        std::fs::write(&cached, b"old").unwrap();
        let stale = std::time::SystemTime::now() - Duration::from_secs(8 * 24 * 60 * 60);
        filetime::set_file_mtime(&cached, filetime::FileTime::from_system_time(stale)).unwrap();

        let h = harness(dir.path(), MockSearch::default(), false);
        let result = h.service.get_thumb("abc").await;

        assert_eq!(result, cached.display().to_string());
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_identical_requests_coalesce() {
        let dir = tempfile::tempdir().unwrap();
        let search = MockSearch {
            delay: Some(Duration::from_millis(50)),
            ..MockSearch::default()
        };
        let h = harness(dir.path(), search, false);

        let (a, b) = tokio::join!(h.service.get_thumb("xyz"), h.service.get_thumb("xyz"));

        let expected = final_path(dir.path(), "xyz").display().to_string();
        assert_eq!(a, expected);
        assert_eq!(b, expected);
        assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
    }
}
