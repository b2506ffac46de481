//! Layer flattening.
//!
//! [`compose`] is the export path: it renders at the base image's native
//! resolution and is a pure function of its inputs. The editor's live preview
//! goes through the same [`render_scene`] routine at viewport size.
//!
//! Draw order is fixed:
//! 1. Base image, with the filter chain applied to it alone
//! 2. Freehand drawing buffer, stretched to cover the canvas
//! 3. Overlay layers in insertion order (text and stickers interleaved)

use std::collections::HashMap;

use image::imageops::FilterType;
use image::RgbaImage;
use kurbo::Affine;
use thiserror::Error;

use crate::config::EditorConfig;
use crate::decode::{load_image, AssetLoader, DecodeError, MediaAsset, MediaKind};
use crate::encode::{encode_data_uri, EncodeError};
use crate::filter::{apply_ops, resolve, FilterError, FilterOp};
use crate::geometry::ViewportSize;
use crate::layer::{LayerKind, OverlayLayer, StickerLayer, StickerSource, TextLayer};
use crate::raster::{
    draw_image_stretched, draw_image_transformed, draw_text, render_glyph_tile, FontBook, TextStyle,
};
use crate::Color;

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The base media could not be loaded or decoded.
    #[error("Failed to load base media: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The base image has no pixels.
    #[error("Base image is empty ({width}x{height})")]
    EmptyBase { width: u32, height: u32 },

    /// Only still images can be flattened.
    #[error("Cannot compose {0:?} media")]
    UnsupportedMedia(MediaKind),
}

/// Everything drawn into one frame apart from the base image.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub layers: &'a [OverlayLayer],
    pub drawing: Option<&'a RgbaImage>,
    /// Filter chain for the base pass.
    pub filter_ops: &'a [FilterOp],
    /// Faces for text layers and glyph stickers.
    pub fonts: &'a FontBook,
    /// Multiplier applied to every text layer's font size.
    pub font_scale: f64,
    pub outline_color: Color,
}

/// Decoded sticker rasters keyed by source.
///
/// Failed loads are not cached, so a source registered later is picked up on
/// the next render. Glyph tiles depend on the registered fonts; call
/// [`StickerCache::clear`] after registering one.
#[derive(Debug, Default)]
pub struct StickerCache {
    tiles: HashMap<StickerSource, RgbaImage>,
}

impl StickerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    fn get_or_load(
        &mut self,
        source: &StickerSource,
        fonts: &FontBook,
        loader: &dyn AssetLoader,
    ) -> Option<&RgbaImage> {
        if !self.tiles.contains_key(source) {
            let tile = match source {
                StickerSource::Glyph(glyph) => {
                    if !fonts.covers(glyph) {
                        tracing::warn!(glyph = %glyph, faces = fonts.len(), "No font covers sticker glyph, drawing placeholder");
                    }
                    match render_glyph_tile(fonts, glyph, Color::WHITE) {
                        Some(tile) => tile,
                        None => {
                            tracing::warn!(glyph = %glyph, "Sticker glyph is blank, skipping");
                            return None;
                        }
                    }
                }
                StickerSource::Image(uri) => match load_image(loader, uri) {
                    Ok(tile) => tile,
                    Err(err) => {
                        tracing::warn!(error = %err, uri = %uri, "Failed to load sticker, skipping");
                        return None;
                    }
                },
            };
            self.tiles.insert(source.clone(), tile);
        }
        self.tiles.get(source)
    }
}

/// Render one frame of `size` pixels.
///
/// With no base the frame starts black, which is what the editor shows while
/// the base is still decoding. A base of a different size is resampled to
/// cover the frame.
pub fn render_scene(
    base: Option<&RgbaImage>,
    size: ViewportSize,
    scene: &Scene<'_>,
    stickers: &mut StickerCache,
    loader: &dyn AssetLoader,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(size.width, size.height);
    if size.is_empty() {
        return canvas;
    }

    // Base pass: the filter sees nothing but the base.
    let mut base_pass = match base {
        Some(base) if base.dimensions() == (size.width, size.height) => base.clone(),
        Some(base) if base.width() > 0 && base.height() > 0 => {
            image::imageops::resize(base, size.width, size.height, FilterType::Triangle)
        }
        _ => RgbaImage::from_pixel(size.width, size.height, image::Rgba([0, 0, 0, 255])),
    };
    apply_ops(&mut base_pass, scene.filter_ops);
    draw_image_stretched(&mut canvas, &base_pass);

    if let Some(drawing) = scene.drawing {
        draw_image_stretched(&mut canvas, drawing);
    }

    let (w, h) = (size.width as f64, size.height as f64);
    for layer in scene.layers {
        match &layer.kind {
            LayerKind::Sticker(sticker) => {
                draw_sticker(&mut canvas, layer, sticker, scene.fonts, stickers, loader);
            }
            LayerKind::Text(text) => draw_text_layer(&mut canvas, layer, text, scene, w, h),
        }
    }

    canvas
}

fn draw_sticker(
    canvas: &mut RgbaImage,
    layer: &OverlayLayer,
    sticker: &StickerLayer,
    fonts: &FontBook,
    stickers: &mut StickerCache,
    loader: &dyn AssetLoader,
) {
    let Some(tile) = stickers.get_or_load(&sticker.source, fonts, loader) else {
        return;
    };
    let (w, h) = (canvas.width() as f64, canvas.height() as f64);
    let side = sticker.size_unit * w;
    let center = layer.position.to_pixels(w, h);
    let transform =
        Affine::translate(center.to_vec2()) * Affine::rotate(sticker.rotation_deg.to_radians());
    draw_image_transformed(canvas, tile, transform, side, side);
}

fn draw_text_layer(canvas: &mut RgbaImage, layer: &OverlayLayer, text: &TextLayer, scene: &Scene<'_>, w: f64, h: f64) {
    let font_px = text.font_size_px as f64 * scene.font_scale;
    let style = TextStyle::outlined(text.color, scene.outline_color, font_px);
    draw_text(
        canvas,
        scene.fonts,
        &text.font_family,
        &text.content,
        layer.position.to_pixels(w, h),
        font_px,
        style,
    );
}

/// Flatten `layers` and `drawing` onto `base` at the base's native resolution.
///
/// Text sizes are rescaled from the reference canvas width to the base width.
/// Text and glyph stickers draw from `fonts`. A sticker that fails to load is
/// logged and skipped; nothing else about the layer set can fail.
///
/// # Errors
///
/// Returns `ComposeError::Filter` if `filter_name` is not in the catalog and
/// `ComposeError::EmptyBase` if the base has no pixels.
pub fn compose(
    base: &RgbaImage,
    layers: &[OverlayLayer],
    drawing: Option<&RgbaImage>,
    filter_name: &str,
    config: &EditorConfig,
    fonts: &FontBook,
    loader: &dyn AssetLoader,
) -> Result<RgbaImage, ComposeError> {
    let filter = resolve(filter_name)?;
    let filter_ops = filter.ops()?;

    let (width, height) = base.dimensions();
    if width == 0 || height == 0 {
        return Err(ComposeError::EmptyBase { width, height });
    }

    let scene = Scene {
        layers,
        drawing,
        filter_ops: &filter_ops,
        fonts,
        font_scale: config.text_scale(width as f64),
        outline_color: config.text_outline_color,
    };

    let mut stickers = StickerCache::new();
    Ok(render_scene(
        Some(base),
        ViewportSize::new(width, height),
        &scene,
        &mut stickers,
        loader,
    ))
}

/// Load the base media, flatten, and encode to a JPEG data URI.
///
/// # Errors
///
/// Video media is rejected with `ComposeError::UnsupportedMedia`; callers pass
/// video through untouched.
pub fn compose_media(
    asset: &MediaAsset,
    layers: &[OverlayLayer],
    drawing: Option<&RgbaImage>,
    filter_name: &str,
    config: &EditorConfig,
    fonts: &FontBook,
    loader: &dyn AssetLoader,
) -> Result<String, ComposeError> {
    if asset.kind != MediaKind::Image {
        return Err(ComposeError::UnsupportedMedia(asset.kind));
    }
    let base = load_image(loader, &asset.source_uri)?;
    let flattened = compose(&base, layers, drawing, filter_name, config, fonts, loader)?;
    Ok(encode_data_uri(&flattened, config.export_quality)?)
}
