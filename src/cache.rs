use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Canonical cache path for a finished thumbnail.
pub fn final_path(cache_dir: &Path, videoid: &str) -> PathBuf {
    cache_dir.join(format!("{videoid}.png"))
}

/// Temp path holding the raw downloaded image until compositing is done.
pub fn temp_path(cache_dir: &Path, videoid: &str) -> PathBuf {
    cache_dir.join(format!("thumb{videoid}.png"))
}

/// Whether a cached artifact at `path` is still fresh.
///
/// Missing files, unreadable metadata, and clock anomalies all count as
/// invalid so the caller can simply re-render instead of handling errors.
pub fn is_cache_valid(path: &Path, ttl: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|mtime| SystemTime::now().duration_since(mtime).ok())
        .map(|age| age < ttl)
        .unwrap_or(false)
}
