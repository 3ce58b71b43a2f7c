use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Runtime configuration, read from the environment with defaults.
///
/// Constructed once and owned by the service; nothing in this crate installs
/// a global instance.
#[derive(Clone, Debug)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
    pub fallback_url: String,
    pub search_api_url: String,
    pub font_path: PathBuf,
    pub font2_path: PathBuf,
    pub branding: String,
}

impl Config {
    pub fn from_env() -> Self {
        let cache_dir = env::var("CACHE_DIR").unwrap_or("cache".to_string());

        let cache_ttl_secs = env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let fallback_url = env::var("FALLBACK_THUMB_URL")
            .unwrap_or("https://i.ytimg.com/vi/default/maxresdefault.jpg".to_string());

        let search_api_url =
            env::var("SEARCH_API_URL").unwrap_or("http://127.0.0.1:8090/search".to_string());

        let font_path = env::var("FONT_PATH").unwrap_or("assets/font.ttf".to_string());
        let font2_path = env::var("FONT2_PATH").unwrap_or("assets/font2.ttf".to_string());

        let branding = env::var("BRANDING").unwrap_or("THUMBFORGE MUSIC".to_string());

        Self {
            cache_dir: PathBuf::from(cache_dir),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            fallback_url,
            search_api_url,
            font_path: PathBuf::from(font_path),
            font2_path: PathBuf::from(font2_path),
            branding,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
