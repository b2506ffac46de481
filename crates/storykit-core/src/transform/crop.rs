//! Square crop viewport with pan, zoom, and quarter-turn rotation.

use image::{Rgba, RgbaImage};
use kurbo::{Affine, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::config::CropperConfig;
use crate::raster::draw_image_transformed;

/// Live crop transform, mutated by cropper gestures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropTransform {
    pub zoom: f64,
    /// Accumulated rotation; never wrapped or clamped.
    pub rotation_deg: f64,
    /// Pan offset in viewport pixels.
    pub offset: Vec2,
}

impl Default for CropTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            rotation_deg: 0.0,
            offset: Vec2::ZERO,
        }
    }
}

impl CropTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zoom_in(&mut self, config: &CropperConfig) {
        self.set_zoom(self.zoom + config.zoom_step, config);
    }

    pub fn zoom_out(&mut self, config: &CropperConfig) {
        self.set_zoom(self.zoom - config.zoom_step, config);
    }

    /// Set zoom directly, clamped to the configured range. NaN is ignored.
    ///
    /// An inverted range resolves to `max_zoom`.
    pub fn set_zoom(&mut self, zoom: f64, config: &CropperConfig) {
        if zoom.is_nan() {
            return;
        }
        self.zoom = zoom.max(config.min_zoom).min(config.max_zoom);
    }

    pub fn rotate(&mut self, config: &CropperConfig) {
        self.rotation_deg += config.rotation_step_deg;
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Local-to-viewport transform for a square viewport of side `side`.
    pub fn affine(&self, side: f64) -> Affine {
        let center = Vec2::new(side / 2.0, side / 2.0) + self.offset;
        Affine::translate(center)
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::scale(self.zoom)
    }
}

/// Size that fills a `side x side` square with the shorter image dimension.
///
/// The longer dimension overflows and is clipped by the viewport.
pub fn aspect_fill_size(image_width: u32, image_height: u32, side: f64) -> Size {
    if image_width == 0 || image_height == 0 {
        return Size::ZERO;
    }
    let aspect = image_width as f64 / image_height as f64;
    if aspect > 1.0 {
        Size::new(side * aspect, side)
    } else {
        Size::new(side, side / aspect)
    }
}

/// Render the crop viewport exactly as displayed.
///
/// The viewport is filled black first; with no source loaded yet the result
/// is a black square.
pub fn render_crop_viewport(
    source: Option<&RgbaImage>,
    transform: &CropTransform,
    side: u32,
) -> RgbaImage {
    let mut viewport = RgbaImage::from_pixel(side, side, Rgba([0, 0, 0, 255]));

    if let Some(src) = source {
        let size = aspect_fill_size(src.width(), src.height(), side as f64);
        draw_image_transformed(
            &mut viewport,
            src,
            transform.affine(side as f64),
            size.width,
            size.height,
        );
    }
    viewport
}
