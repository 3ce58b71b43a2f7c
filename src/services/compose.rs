use ab_glyph::{Font, FontVec, PxScale};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::cache::{final_path, temp_path};
use crate::config::Config;
use crate::error::ThumbError;
use crate::models::VideoMetadata;
use crate::text::{clear, truncate_chars};

const CANVAS_WIDTH: u32 = 1280;
const CANVAS_HEIGHT: u32 = 720;
const BLUR_SIGMA: f32 = 10.0;
const BACKDROP_BRIGHTNESS: f32 = 0.5;
const TITLE_MAX_WIDTH: u32 = 1200;
const BASE_FONT_SIZE: f32 = 30.0;
const MIN_FONT_SIZE: f32 = 10.0;

/// Banner rendering seam; mocked in orchestrator tests.
#[async_trait]
pub trait ThumbCompositor: Send + Sync {
    async fn compose(&self, videoid: &str, meta: &VideoMetadata) -> Result<PathBuf, ThumbError>;
}

/// Renders the final banner from the downloaded source image.
#[derive(Clone)]
pub struct ImageCompositor {
    cache_dir: PathBuf,
    font_path: PathBuf,
    font2_path: PathBuf,
    branding: String,
}

impl ImageCompositor {
    pub fn new(config: &Config) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            font_path: config.font_path.clone(),
            font2_path: config.font2_path.clone(),
            branding: config.branding.clone(),
        }
    }

    fn render(&self, videoid: &str, meta: &VideoMetadata) -> anyhow::Result<PathBuf> {
        let source_path = temp_path(&self.cache_dir, videoid);
        let source = image::open(&source_path)
            .with_context(|| format!("failed to open {}", source_path.display()))?;

        // Stretches to the full canvas: both axes scale independently, so
        // off-ratio sources distort rather than letterbox.
        let resized = source.resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, imageops::FilterType::Lanczos3);
        let mut background = imageops::blur(&resized.to_rgba8(), BLUR_SIGMA);
        darken(&mut background, BACKDROP_BRIGHTNESS);
        apply_vertical_gradient(&mut background);

        let font = load_font(&self.font_path)?;
        let arial = load_font(&self.font2_path)?;
        let white = Rgba([255u8, 255, 255, 255]);
        let scale = PxScale::from(BASE_FONT_SIZE);

        // Branding, right-aligned against the top edge
        let (brand_width, _) = text_size(scale, &font, &self.branding);
        draw_text_mut(
            &mut background,
            white,
            CANVAS_WIDTH as i32 - brand_width as i32 - 10,
            10,
            scale,
            &font,
            &self.branding,
        );

        let byline = format!("{} | {}", meta.channel, truncate_chars(&meta.views, 23));
        draw_text_mut(&mut background, white, 55, 560, scale, &arial, &byline);

        let title = clear(&meta.title);
        let title_scale = fit_title_scale(&font, &title);
        draw_text_mut(&mut background, white, 57, 600, title_scale, &font, &title);

        // Progress-bar affordance: separator, position dot, elapsed and total
        draw_filled_rect_mut(&mut background, Rect::at(55, 658).of_size(1165, 5), white);
        draw_filled_circle_mut(&mut background, (930, 660), 12, white);
        draw_text_mut(&mut background, white, 36, 685, scale, &arial, "00:00");
        let total = truncate_chars(&meta.duration, 23);
        draw_text_mut(&mut background, white, 1185, 685, scale, &arial, &total);

        let out_path = final_path(&self.cache_dir, videoid);
        background
            .save(&out_path)
            .with_context(|| format!("failed to save {}", out_path.display()))?;
        Ok(out_path)
    }
}

#[async_trait]
impl ThumbCompositor for ImageCompositor {
    async fn compose(&self, videoid: &str, meta: &VideoMetadata) -> Result<PathBuf, ThumbError> {
        let compositor = self.clone();
        let id = videoid.to_string();
        let meta = meta.clone();

        // Decoding, filtering, and encoding are CPU bound; keep them off the
        // async runtime.
        let rendered = tokio::task::spawn_blocking(move || compositor.render(&id, &meta))
            .await
            .map_err(|e| ThumbError::Composite(anyhow!("render task panicked: {e}")))?;

        match rendered {
            Ok(path) => {
                info!("Created thumbnail for '{videoid}' at {}", path.display());
                Ok(path)
            }
            Err(e) => {
                error!("Error creating thumbnail for '{videoid}': {e:#}");
                Err(ThumbError::Composite(e))
            }
        }
    }
}

fn load_font(path: &Path) -> anyhow::Result<FontVec> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|_| anyhow!("invalid font file {}", path.display()))
}

// Shrink from the base size until the rendered title fits the pixel budget.
fn fit_title_scale(font: &impl Font, title: &str) -> PxScale {
    let mut size = BASE_FONT_SIZE;
    while size > MIN_FONT_SIZE {
        let (width, _) = text_size(PxScale::from(size), font, title);
        if width <= TITLE_MAX_WIDTH {
            break;
        }
        size -= 1.0;
    }
    PxScale::from(size)
}

fn darken(img: &mut RgbaImage, factor: f32) {
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            pixel[c] = (f32::from(pixel[c]) * factor) as u8;
        }
    }
}

// Composite a vertical black gradient whose alpha ramps 0 at the top to
// fully opaque at the bottom, keeping overlay text legible on any source.
fn apply_vertical_gradient(img: &mut RgbaImage) {
    let height = img.height();
    for (_, y, pixel) in img.enumerate_pixels_mut() {
        let alpha = if height > 1 {
            y as f32 / (height - 1) as f32
        } else {
            1.0
        };
        let keep = 1.0 - alpha;
        for c in 0..3 {
            pixel[c] = (f32::from(pixel[c]) * keep) as u8;
        }
    }
}
