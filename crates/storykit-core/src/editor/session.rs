//! One interactive edit of one piece of media.

use image::RgbaImage;
use kurbo::{Affine, Point, Rect};
use thiserror::Error;

use super::state::{Action, EditorState, InvalidTransition, Mode, Tool};
use crate::compose::{compose, compose_media, render_scene, ComposeError, Scene, StickerCache};
use crate::config::EditorConfig;
use crate::decode::{AssetLoader, DecodeSlot, DecodeTicket, MediaAsset, MediaKind, StaleDecode};
use crate::encode::encode_data_uri;
use crate::filter::{resolve, NORMAL};
use crate::geometry::{ClientRect, UnitPoint, ViewportSize};
use crate::layer::{LayerId, LayerKind, LayerStack, OverlayLayer, StickerLayer, StickerSource, TextLayer};
use crate::raster::{measure_text, DrawingSurface, FontBook, FontError};
use crate::Color;

/// Errors returned by editor operations.
#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("No such layer: {0}")]
    UnknownLayer(LayerId),

    #[error("{0} is not a sticker")]
    NotASticker(LayerId),

    #[error("Invalid sticker size: {0}")]
    InvalidStickerSize(f64),

    #[error(transparent)]
    StaleDecode(#[from] StaleDecode),

    #[error(transparent)]
    Font(#[from] FontError),
}

/// Interactive editor for one base media item.
///
/// The drawing buffer is sized to the viewport at creation and never resized.
#[derive(Debug)]
pub struct EditorSession {
    asset: MediaAsset,
    config: EditorConfig,
    viewport: ViewportSize,
    mode: Mode,
    layers: LayerStack,
    drawing: DrawingSurface,
    color: Color,
    brush_size: f32,
    filter: String,
    base: Option<RgbaImage>,
    decode: DecodeSlot,
    fonts: FontBook,
    stickers: StickerCache,
}

impl EditorSession {
    pub fn new(asset: MediaAsset, viewport: ViewportSize, config: EditorConfig) -> Self {
        let decode = DecodeSlot::new();
        tracing::debug!(session = decode.session(), uri_len = asset.source_uri.len(), kind = ?asset.kind, "Editor session started");

        Self {
            asset,
            viewport,
            mode: Mode::new(),
            layers: LayerStack::new(),
            drawing: DrawingSurface::new(viewport),
            color: config.default_color,
            brush_size: config.clamp_brush_size(config.default_brush_size),
            filter: NORMAL.name.to_string(),
            base: None,
            decode,
            fonts: FontBook::new(),
            stickers: StickerCache::new(),
            config,
        }
    }

    pub fn id(&self) -> u64 {
        self.decode.session()
    }

    pub fn asset(&self) -> &MediaAsset {
        &self.asset
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn state(&self) -> EditorState {
        self.mode.state
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.mode.tool
    }

    pub fn layers(&self) -> &[OverlayLayer] {
        self.layers.as_slice()
    }

    pub fn layer(&self, id: LayerId) -> Option<&OverlayLayer> {
        self.layers.get(id)
    }

    pub fn drawing(&self) -> &DrawingSurface {
        &self.drawing
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    /// Name of the active filter.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// True once a decoded base image has been delivered.
    pub fn is_decoded(&self) -> bool {
        self.base.is_some()
    }

    /// Native size of the delivered base image.
    pub fn decoded_size(&self) -> Option<(u32, u32)> {
        self.base.as_ref().map(RgbaImage::dimensions)
    }

    fn apply(&mut self, action: Action) -> Result<(), EditorError> {
        self.mode = self.mode.apply(action)?;
        Ok(())
    }

    // ---- tools and settings ----

    /// Activate `tool`, or deactivate it if it is already active.
    pub fn activate_tool(&mut self, tool: Tool) -> Result<(), EditorError> {
        self.apply(Action::ActivateTool(tool))
    }

    /// Make a font available to text layers and glyph stickers.
    ///
    /// Text layers try faces named in their font family list first, then
    /// every registered face in order.
    pub fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), EditorError> {
        self.fonts.register(family, bytes)?;
        // Glyph tiles were rasterized without this face.
        self.stickers.clear();
        Ok(())
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Set the brush width, clamped to the configured range.
    pub fn set_brush_size(&mut self, size: f32) {
        if size.is_nan() {
            return;
        }
        self.brush_size = self.config.clamp_brush_size(size);
    }

    /// Make `name` the active filter.
    ///
    /// Not validated here; an unknown name fails at export and falls back to
    /// the original media.
    pub fn select_filter(&mut self, name: impl Into<String>) {
        self.filter = name.into();
    }

    // ---- pointer input ----

    /// Pointer pressed on the drawing surface, in surface pixels.
    ///
    /// Starts a stroke when the draw tool is active; otherwise does nothing.
    pub fn pointer_down(&mut self, at: Point) {
        if self.apply(Action::PointerDown).is_ok() && self.mode.state == EditorState::Drawing {
            self.drawing.begin_path(at);
        }
    }

    /// Pointer moved over the drawing surface, in surface pixels.
    pub fn pointer_move_surface(&mut self, to: Point) {
        if self.mode.state == EditorState::Drawing {
            self.drawing.line_to(to, self.color, self.brush_size as f64);
        }
    }

    /// Pointer moved anywhere, in client coordinates.
    ///
    /// `container` must be measured for this event, not cached from an
    /// earlier one.
    pub fn pointer_move(&mut self, client: Point, container: ClientRect) {
        if let EditorState::Dragging(id) = self.mode.state {
            self.layers.move_to(id, UnitPoint::from_client(client, container));
        }
    }

    /// Pointer released or left the surface. Ends any gesture.
    pub fn pointer_up(&mut self) {
        if self.mode.state == EditorState::Drawing {
            self.drawing.end_path();
        }
        // PointerUp is accepted in every state.
        let _ = self.apply(Action::PointerUp);
    }

    /// Topmost layer under `at`, in viewport pixels.
    ///
    /// Text is hit-tested against its laid-out box at preview size, stickers
    /// against their rotated square.
    pub fn layer_at(&self, at: Point) -> Option<LayerId> {
        let (w, h) = (self.viewport.width as f64, self.viewport.height as f64);
        self.layers
            .iter()
            .rev()
            .find(|layer| {
                let center = layer.position.to_pixels(w, h);
                match &layer.kind {
                    LayerKind::Text(text) => {
                        let size = measure_text(
                            &self.fonts,
                            &text.font_family,
                            &text.content,
                            text.font_size_px as f64,
                        );
                        Rect::from_center_size(center, size).contains(at)
                    }
                    LayerKind::Sticker(sticker) => {
                        let half = sticker.size_unit * w / 2.0;
                        let to_local = (Affine::translate(center.to_vec2())
                            * Affine::rotate(sticker.rotation_deg.to_radians()))
                        .inverse();
                        let local = to_local * at;
                        local.x.abs() <= half && local.y.abs() <= half
                    }
                }
            })
            .map(|layer| layer.id)
    }

    /// Latch `id` for dragging.
    pub fn grab_layer(&mut self, id: LayerId) -> Result<(), EditorError> {
        if !self.layers.contains(id) {
            return Err(EditorError::UnknownLayer(id));
        }
        self.apply(Action::GrabLayer(id))
    }

    // ---- layers ----

    /// Commit text from the text tool at the canvas center.
    ///
    /// Blank text adds nothing and keeps the text tool open; this returns
    /// `Ok(None)`.
    pub fn commit_text(&mut self, content: &str) -> Result<Option<LayerId>, EditorError> {
        if self.mode.state != EditorState::PlacingText {
            return Err(InvalidTransition {
                from: self.mode.state,
                action: Action::CommitText.name(),
            }
            .into());
        }
        if content.trim().is_empty() {
            return Ok(None);
        }

        self.apply(Action::CommitText)?;
        let id = self.layers.push(
            UnitPoint::CENTER,
            LayerKind::Text(TextLayer {
                content: content.to_string(),
                color: self.color,
                font_size_px: self.config.text_font_size_px,
                font_family: self.config.font_family.clone(),
            }),
        );
        Ok(Some(id))
    }

    /// Close the text or sticker picker without adding anything.
    pub fn dismiss_placement(&mut self) -> Result<(), EditorError> {
        self.apply(Action::DismissPlacement)
    }

    /// Add a sticker at the canvas center from the sticker picker.
    pub fn pick_sticker(&mut self, source: StickerSource) -> Result<LayerId, EditorError> {
        self.apply(Action::PickSticker)?;
        Ok(self.layers.push(
            UnitPoint::CENTER,
            LayerKind::Sticker(StickerLayer {
                source,
                size_unit: self.config.sticker_size_unit,
                rotation_deg: 0.0,
            }),
        ))
    }

    /// Resize and rotate a placed sticker.
    pub fn set_sticker_transform(
        &mut self,
        id: LayerId,
        size_unit: f64,
        rotation_deg: f64,
    ) -> Result<(), EditorError> {
        if !(size_unit.is_finite() && size_unit > 0.0) {
            return Err(EditorError::InvalidStickerSize(size_unit));
        }
        let layer = self.layers.get_mut(id).ok_or(EditorError::UnknownLayer(id))?;
        match &mut layer.kind {
            LayerKind::Sticker(sticker) => {
                sticker.size_unit = size_unit;
                sticker.rotation_deg = if rotation_deg.is_finite() { rotation_deg } else { 0.0 };
                Ok(())
            }
            LayerKind::Text(_) => Err(EditorError::NotASticker(id)),
        }
    }

    pub fn delete_layer(&mut self, id: LayerId) -> Result<OverlayLayer, EditorError> {
        let removed = self.layers.remove(id).ok_or(EditorError::UnknownLayer(id))?;
        self.apply(Action::LayerRemoved(id))?;
        Ok(removed)
    }

    // ---- base image decode ----

    /// Start a new decode of the base image, superseding any earlier one.
    pub fn request_decode(&mut self) -> DecodeTicket {
        self.decode.request()
    }

    /// Hand over a decoded base image.
    ///
    /// Results for another session or for a superseded request are rejected.
    pub fn deliver_decoded(&mut self, ticket: DecodeTicket, image: RgbaImage) -> Result<(), EditorError> {
        self.decode.accept(ticket)?;
        tracing::debug!(session = self.id(), width = image.width(), height = image.height(), "Base image decoded");
        self.base = Some(image);
        Ok(())
    }

    // ---- rendering ----

    /// Render the live preview at viewport size.
    ///
    /// Text renders at its nominal size. The frame is black until the base
    /// image has been delivered.
    pub fn render_preview(&mut self, loader: &dyn AssetLoader) -> RgbaImage {
        let filter_ops = match resolve(&self.filter).and_then(|spec| spec.ops()) {
            Ok(ops) => ops,
            Err(err) => {
                tracing::debug!(error = %err, "Previewing without filter");
                Vec::new()
            }
        };
        let scene = Scene {
            layers: self.layers.as_slice(),
            drawing: Some(self.drawing.image()),
            filter_ops: &filter_ops,
            fonts: &self.fonts,
            font_scale: 1.0,
            outline_color: self.config.text_outline_color,
        };
        render_scene(self.base.as_ref(), self.viewport, &scene, &mut self.stickers, loader)
    }

    fn export(&self, loader: &dyn AssetLoader) -> Result<String, ComposeError> {
        let drawing = Some(self.drawing.image());
        match &self.base {
            Some(base) => {
                let flattened = compose(
                    base,
                    self.layers.as_slice(),
                    drawing,
                    &self.filter,
                    &self.config,
                    &self.fonts,
                    loader,
                )?;
                Ok(encode_data_uri(&flattened, self.config.export_quality)?)
            }
            None => compose_media(
                &self.asset,
                self.layers.as_slice(),
                drawing,
                &self.filter,
                &self.config,
                &self.fonts,
                loader,
            ),
        }
    }

    /// End the session and produce the media to hand to the caller.
    ///
    /// Video is forwarded untouched. For images, any export failure also
    /// forwards the original URI rather than surfacing an error.
    pub fn finish(self, loader: &dyn AssetLoader) -> String {
        if self.asset.kind == MediaKind::Video {
            tracing::info!(session = self.id(), "Finished video session, forwarding source");
            return self.asset.source_uri;
        }

        match self.export(loader) {
            Ok(uri) => {
                tracing::info!(
                    session = self.id(),
                    layers = self.layers.len(),
                    filter = %self.filter,
                    "Finished editor session"
                );
                uri
            }
            Err(err) => {
                tracing::warn!(session = self.id(), error = %err, "Export failed, forwarding original media");
                self.asset.source_uri
            }
        }
    }

    /// Abandon the session. Nothing is emitted.
    pub fn cancel(self) {
        tracing::info!(session = self.id(), "Editor session cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{parse_data_uri, decode_image, DecodeError, MemoryLoader};
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    const FULL_BLOCK: &str = "\u{2588}";
    const DEJAVU_SANS: &[u8] = include_bytes!("../../testdata/fonts/DejaVuSans.ttf");

    struct FailingLoader;

    impl AssetLoader for FailingLoader {
        fn load(&self, uri: &str) -> Result<Vec<u8>, DecodeError> {
            Err(DecodeError::AssetNotFound(uri.to_string()))
        }
    }

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn session(kind: MediaKind) -> EditorSession {
        EditorSession::new(
            MediaAsset::new("camera://shot", kind),
            ViewportSize::new(400, 400),
            EditorConfig::default(),
        )
    }

    fn add_text(session: &mut EditorSession, content: &str) -> LayerId {
        session.activate_tool(Tool::Text).unwrap();
        session.commit_text(content).unwrap().unwrap()
    }

    #[test]
    fn test_new_session_defaults() {
        let s = session(MediaKind::Image);
        assert_eq!(s.state(), EditorState::Idle);
        assert_eq!(s.active_tool(), None);
        assert_eq!(s.color(), Color::WHITE);
        assert_eq!(s.brush_size(), 5.0);
        assert_eq!(s.filter(), "Normal");
        assert_eq!(s.drawing().size(), ViewportSize::new(400, 400));
        assert!(!s.is_decoded());
    }

    #[test]
    fn test_session_ids_unique() {
        let a = session(MediaKind::Image);
        let b = session(MediaKind::Image);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_commit_text_appends_at_center() {
        let mut s = session(MediaKind::Image);
        s.set_color(Color::rgb(255, 0, 0));
        let id = add_text(&mut s, "Hello");

        let layer = s.layer(id).unwrap();
        assert_eq!(layer.position, UnitPoint::CENTER);
        let text = layer.as_text().unwrap();
        assert_eq!(text.content, "Hello");
        assert_eq!(text.color, Color::rgb(255, 0, 0));
        assert_eq!(text.font_size_px, 24.0);
        assert_eq!(s.state(), EditorState::Idle);
        assert_eq!(s.active_tool(), None);
    }

    #[test]
    fn test_empty_text_commits_nothing() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Text).unwrap();
        assert_eq!(s.commit_text("").unwrap(), None);
        assert_eq!(s.commit_text("   \n\t").unwrap(), None);
        assert!(s.layers().is_empty());
        assert_eq!(s.state(), EditorState::PlacingText);
    }

    #[test]
    fn test_commit_text_outside_text_tool() {
        let mut s = session(MediaKind::Image);
        assert!(matches!(s.commit_text("hi"), Err(EditorError::InvalidTransition(_))));
        assert!(s.layers().is_empty());
    }

    #[test]
    fn test_dismiss_text() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Text).unwrap();
        s.dismiss_placement().unwrap();
        assert_eq!(s.state(), EditorState::Idle);
        assert!(s.layers().is_empty());
    }

    #[test]
    fn test_pick_sticker() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Sticker).unwrap();
        let id = s.pick_sticker(StickerSource::Glyph("🔥".to_string())).unwrap();

        let sticker = s.layer(id).unwrap().as_sticker().unwrap();
        assert_eq!(sticker.size_unit, 0.25);
        assert_eq!(sticker.rotation_deg, 0.0);
        assert_eq!(s.state(), EditorState::Idle);
    }

    #[test]
    fn test_pick_sticker_requires_picker() {
        let mut s = session(MediaKind::Image);
        assert!(s.pick_sticker(StickerSource::Glyph("🔥".to_string())).is_err());
        assert!(s.layers().is_empty());
    }

    #[test]
    fn test_set_sticker_transform() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Sticker).unwrap();
        let id = s.pick_sticker(StickerSource::Image("sticker://star".to_string())).unwrap();

        s.set_sticker_transform(id, 0.4, 30.0).unwrap();
        let sticker = s.layer(id).unwrap().as_sticker().unwrap();
        assert_eq!(sticker.size_unit, 0.4);
        assert_eq!(sticker.rotation_deg, 30.0);

        assert_eq!(
            s.set_sticker_transform(id, 0.0, 0.0),
            Err(EditorError::InvalidStickerSize(0.0))
        );
        let text = add_text(&mut s, "x");
        assert_eq!(s.set_sticker_transform(text, 0.3, 0.0), Err(EditorError::NotASticker(text)));
        assert_eq!(
            s.set_sticker_transform(LayerId(99), 0.3, 0.0),
            Err(EditorError::UnknownLayer(LayerId(99)))
        );
    }

    #[test]
    fn test_drag_updates_unit_position() {
        let mut s = session(MediaKind::Image);
        let id = add_text(&mut s, "drag me");
        let container = ClientRect::new(0.0, 0.0, 400.0, 400.0);

        s.grab_layer(id).unwrap();
        s.pointer_move(Point::new(200.0, 200.0), container);
        s.pointer_move(Point::new(300.0, 100.0), container);
        s.pointer_up();

        let position = s.layer(id).unwrap().position;
        assert!((position.x - 0.75).abs() < 1e-9);
        assert!((position.y - 0.25).abs() < 1e-9);
        assert_eq!(s.state(), EditorState::Idle);
    }

    #[test]
    fn test_drag_uses_current_container_rect() {
        let mut s = session(MediaKind::Image);
        let id = add_text(&mut s, "drag me");
        s.grab_layer(id).unwrap();

        s.pointer_move(Point::new(300.0, 100.0), ClientRect::new(0.0, 0.0, 400.0, 400.0));
        // Container scrolled by 100px before the next move.
        s.pointer_move(Point::new(300.0, 100.0), ClientRect::new(100.0, 0.0, 400.0, 400.0));

        let position = s.layer(id).unwrap().position;
        assert!((position.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_moves_after_release_do_nothing() {
        let mut s = session(MediaKind::Image);
        let id = add_text(&mut s, "still");
        let container = ClientRect::new(0.0, 0.0, 400.0, 400.0);
        s.grab_layer(id).unwrap();
        s.pointer_up();
        s.pointer_move(Point::new(0.0, 0.0), container);
        assert_eq!(s.layer(id).unwrap().position, UnitPoint::CENTER);
    }

    #[test]
    fn test_drag_can_leave_canvas() {
        let mut s = session(MediaKind::Image);
        let id = add_text(&mut s, "bye");
        s.grab_layer(id).unwrap();
        s.pointer_move(Point::new(-40.0, 600.0), ClientRect::new(0.0, 0.0, 400.0, 400.0));
        let position = s.layer(id).unwrap().position;
        assert!((position.x + 0.1).abs() < 1e-9);
        assert!((position.y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_layer_at_prefers_topmost() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Sticker).unwrap();
        let sticker = s.pick_sticker(StickerSource::Glyph("🔥".to_string())).unwrap();
        let text = add_text(&mut s, "hi");

        // "hi" at 24px spans 48x24 around the center.
        assert_eq!(s.layer_at(Point::new(200.0, 200.0)), Some(text));
        assert_eq!(s.layer_at(Point::new(200.0, 240.0)), Some(sticker));
        assert_eq!(s.layer_at(Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn test_layer_at_uses_registered_font_metrics() {
        let mut bitmap_only = session(MediaKind::Image);
        let mut with_font = session(MediaKind::Image);
        with_font.register_font("Inter", DEJAVU_SANS.to_vec()).unwrap();
        add_text(&mut bitmap_only, "iiiiiiii");
        let id = add_text(&mut with_font, "iiiiiiii");

        // Eight 24px bitmap cells reach 96px either side; the font's narrow
        // "i" stays well inside that.
        let beside = Point::new(260.0, 200.0);
        assert!(bitmap_only.layer_at(beside).is_some());
        assert_eq!(with_font.layer_at(beside), None);
        assert_eq!(with_font.layer_at(Point::new(200.0, 200.0)), Some(id));
    }

    #[test]
    fn test_register_font_rejects_garbage() {
        let mut s = session(MediaKind::Image);
        assert!(matches!(
            s.register_font("Broken", vec![0; 16]),
            Err(EditorError::Font(FontError::InvalidFont { .. }))
        ));
        assert!(s.fonts().is_empty());
    }

    #[test]
    fn test_register_font_refreshes_glyph_stickers() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Sticker).unwrap();
        s.pick_sticker(StickerSource::Glyph("😀".to_string())).unwrap();

        let placeholder = s.render_preview(&MemoryLoader::new());
        s.register_font("DejaVu Sans", DEJAVU_SANS.to_vec()).unwrap();
        let outlined = s.render_preview(&MemoryLoader::new());
        assert_ne!(placeholder, outlined);
    }

    #[test]
    fn test_layer_at_follows_sticker_rotation() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Sticker).unwrap();
        let id = s.pick_sticker(StickerSource::Glyph("🔥".to_string())).unwrap();
        // 100px square at the center; a corner point is inside until rotated.
        assert_eq!(s.layer_at(Point::new(245.0, 245.0)), Some(id));
        s.set_sticker_transform(id, 0.25, 45.0).unwrap();
        assert_eq!(s.layer_at(Point::new(245.0, 245.0)), None);
    }

    #[test]
    fn test_grab_unknown_layer() {
        let mut s = session(MediaKind::Image);
        assert_eq!(s.grab_layer(LayerId(42)), Err(EditorError::UnknownLayer(LayerId(42))));
    }

    #[test]
    fn test_draw_tool_strokes_surface() {
        let mut s = session(MediaKind::Image);
        s.activate_tool(Tool::Draw).unwrap();
        s.set_color(Color::rgb(255, 0, 0));
        s.set_brush_size(10.0);

        s.pointer_down(Point::new(100.0, 100.0));
        assert_eq!(s.state(), EditorState::Drawing);
        s.pointer_move_surface(Point::new(200.0, 100.0));
        s.pointer_up();

        assert_eq!(s.state(), EditorState::Idle);
        assert!(!s.drawing().has_open_path());
        assert_eq!(s.drawing().image().get_pixel(150, 100).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_pointer_without_draw_tool_does_not_draw() {
        let mut s = session(MediaKind::Image);
        s.pointer_down(Point::new(100.0, 100.0));
        s.pointer_move_surface(Point::new(200.0, 100.0));
        s.pointer_up();
        assert!(s.drawing().is_blank());
    }

    #[test]
    fn test_brush_size_clamped() {
        let mut s = session(MediaKind::Image);
        s.set_brush_size(100.0);
        assert_eq!(s.brush_size(), 20.0);
        s.set_brush_size(0.0);
        assert_eq!(s.brush_size(), 2.0);
        s.set_brush_size(f32::NAN);
        assert_eq!(s.brush_size(), 2.0);
    }

    #[test]
    fn test_delete_layer() {
        let mut s = session(MediaKind::Image);
        let a = add_text(&mut s, "a");
        let b = add_text(&mut s, "b");
        s.grab_layer(b).unwrap();

        let removed = s.delete_layer(b).unwrap();
        assert_eq!(removed.id, b);
        assert_eq!(s.state(), EditorState::Idle);
        assert_eq!(s.layers().len(), 1);
        assert_eq!(s.layers()[0].id, a);
        assert_eq!(s.delete_layer(b), Err(EditorError::UnknownLayer(b)));
    }

    #[test]
    fn test_layer_ids_monotonic() {
        let mut s = session(MediaKind::Image);
        let a = add_text(&mut s, "a");
        s.delete_layer(a).unwrap();
        let b = add_text(&mut s, "b");
        assert!(b > a);
    }

    #[test]
    fn test_stale_decode_rejected() {
        let mut s = session(MediaKind::Image);
        let first = s.request_decode();
        let second = s.request_decode();

        let img = RgbaImage::new(8, 8);
        assert!(matches!(
            s.deliver_decoded(first, img.clone()),
            Err(EditorError::StaleDecode(_))
        ));
        assert!(!s.is_decoded());

        s.deliver_decoded(second, img).unwrap();
        assert!(s.is_decoded());
        assert_eq!(s.decoded_size(), Some((8, 8)));
    }

    #[test]
    fn test_decode_leaves_asset_untouched() {
        let mut s = session(MediaKind::Image);
        let before = s.asset().clone();
        let ticket = s.request_decode();
        s.deliver_decoded(ticket, RgbaImage::new(12, 7)).unwrap();

        assert_eq!(s.asset(), &before);
        assert_eq!(s.asset().dimensions, None);
        assert_eq!(s.decoded_size(), Some((12, 7)));
    }

    #[test]
    fn test_decode_for_other_session_rejected() {
        let mut a = session(MediaKind::Image);
        let mut b = session(MediaKind::Image);
        let ticket = a.request_decode();
        b.request_decode();
        assert!(b.deliver_decoded(ticket, RgbaImage::new(2, 2)).is_err());
        assert!(a.deliver_decoded(ticket, RgbaImage::new(2, 2)).is_ok());
    }

    #[test]
    fn test_preview_black_until_decoded() {
        let mut s = session(MediaKind::Image);
        let frame = s.render_preview(&MemoryLoader::new());
        assert_eq!(frame.dimensions(), (400, 400));
        assert_eq!(frame.get_pixel(10, 10).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_preview_shows_filtered_base_and_text() {
        let mut s = session(MediaKind::Image);
        let ticket = s.request_decode();
        s.deliver_decoded(ticket, RgbaImage::from_pixel(800, 800, Rgba([255, 0, 0, 255])))
            .unwrap();
        s.select_filter("Grayscale");
        s.set_color(Color::rgb(0, 0, 255));
        add_text(&mut s, FULL_BLOCK);

        let frame = s.render_preview(&MemoryLoader::new());
        let base = frame.get_pixel(10, 10).0;
        assert_eq!(base[0], base[1]);
        assert_eq!(frame.get_pixel(200, 200).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_preview_with_unknown_filter_renders_unfiltered() {
        let mut s = session(MediaKind::Image);
        let ticket = s.request_decode();
        s.deliver_decoded(ticket, RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])))
            .unwrap();
        s.select_filter("Polaroid");
        let frame = s.render_preview(&MemoryLoader::new());
        assert_eq!(frame.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_finish_video_forwards_source() {
        let mut s = session(MediaKind::Video);
        add_text(&mut s, "ignored");
        assert_eq!(s.finish(&FailingLoader), "camera://shot");
    }

    #[test]
    fn test_finish_falls_back_when_decode_fails() {
        let mut s = session(MediaKind::Image);
        add_text(&mut s, "lost");
        assert_eq!(s.finish(&FailingLoader), "camera://shot");
    }

    #[test]
    fn test_finish_falls_back_on_unknown_filter() {
        let mut s = session(MediaKind::Image);
        let ticket = s.request_decode();
        s.deliver_decoded(ticket, RgbaImage::new(4, 4)).unwrap();
        s.select_filter("Polaroid");
        assert_eq!(s.finish(&MemoryLoader::new()), "camera://shot");
    }

    #[test]
    fn test_finish_exports_native_resolution() {
        let mut loader = MemoryLoader::new();
        loader.insert("camera://shot", png_bytes(&RgbaImage::from_pixel(640, 480, Rgba([20, 40, 60, 255]))));
        let mut s = session(MediaKind::Image);
        add_text(&mut s, "hello");

        let uri = s.finish(&loader);
        let (_, bytes) = parse_data_uri(&uri).unwrap();
        assert_eq!(decode_image(&bytes).unwrap().dimensions(), (640, 480));
    }

    #[test]
    fn test_finish_uses_delivered_base() {
        let mut s = session(MediaKind::Image);
        let ticket = s.request_decode();
        s.deliver_decoded(ticket, RgbaImage::from_pixel(300, 200, Rgba([255, 255, 255, 255])))
            .unwrap();

        // The loader cannot resolve the source, but the decoded base is enough.
        let uri = s.finish(&FailingLoader);
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }
}
