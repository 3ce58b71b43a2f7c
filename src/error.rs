use thiserror::Error;

/// Failure modes of the thumbnail pipeline.
///
/// Each stage produces exactly one variant; the orchestrator matches on the
/// result and converts any error into the fallback URL. Nothing outside the
/// orchestrator ever sees these failures.
#[derive(Debug, Error)]
pub enum ThumbError {
    #[error("video info lookup failed: {0}")]
    VideoInfo(anyhow::Error),

    #[error("thumbnail download failed: {0}")]
    Download(anyhow::Error),

    #[error("thumbnail composition failed: {0}")]
    Composite(anyhow::Error),
}
