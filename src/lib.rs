//! Styled "now playing" thumbnail generation for a music bot.
//!
//! Given a video id, [`ThumbnailService::get_thumb`] returns the path of a
//! composited 1280x720 banner, rendering and caching it on first use. The
//! call never fails: any error in the metadata/download/composite pipeline
//! degrades to a configured fallback image URL.

mod cache;
mod config;
mod error;
mod models;
mod services;
mod text;

pub use config::Config;
pub use error::ThumbError;
pub use models::VideoMetadata;
pub use services::compose::{ImageCompositor, ThumbCompositor};
pub use services::download::{HttpDownloader, ThumbDownloader};
pub use services::search::{HttpVideoSearch, VideoSearch};
pub use services::thumbnails::ThumbnailService;
