//! Editor session bindings.
//!
//! Wraps [`EditorSession`] for a browser host. The host owns the DOM, feeds
//! pointer events in, and paints the frames returned by `renderPreview()`.
//! Bytes for the base media and for image stickers are registered up front
//! under their URIs; `data:` URIs need no registration. Fonts for text and
//! glyph stickers are registered the same way with `registerFont`.
//!
//! # Example
//!
//! ```typescript
//! import { JsEditorSession } from '@storykit/wasm';
//!
//! const editor = new JsEditorSession(uri, 'image', 400, 711, undefined);
//! editor.registerFont('Inter', new Uint8Array(await (await fetch(interTtf)).arrayBuffer()));
//! const ticket = editor.requestDecode();
//! editor.deliverDecoded(ticket, new Uint8Array(await blob.arrayBuffer()));
//!
//! editor.activateTool('text');
//! editor.commitText('hello');
//! editor.done((finalUri) => upload(finalUri));
//! ```

use js_sys::Function;
use storykit_core::decode::{decode_image, MemoryLoader};
use storykit_core::geometry::ClientRect;
use storykit_core::kurbo::Point;
use storykit_core::{
    Color, EditorConfig, EditorSession, LayerId, MediaAsset, MediaKind, StickerSource, Tool, ViewportSize,
};
use wasm_bindgen::prelude::*;

use crate::types::{config_from_js, session_closed, JsDecodeTicket, JsRaster};

/// One interactive edit, closed by exactly one of `done()` or `cancel()`.
#[wasm_bindgen]
pub struct JsEditorSession {
    session: Option<EditorSession>,
    loader: MemoryLoader,
}

#[wasm_bindgen]
impl JsEditorSession {
    /// Open an editor over `media_source`.
    ///
    /// # Arguments
    ///
    /// * `media_source` - URI of the base media
    /// * `media_kind` - `"image"` or `"video"`
    /// * `viewport_width`, `viewport_height` - preview surface size in pixels
    /// * `config` - optional partial `EditorConfig` object
    #[wasm_bindgen(constructor)]
    pub fn new(
        media_source: String,
        media_kind: &str,
        viewport_width: u32,
        viewport_height: u32,
        config: JsValue,
    ) -> Result<JsEditorSession, JsValue> {
        let kind = MediaKind::parse(media_kind)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown media kind: {media_kind}")))?;
        let config: EditorConfig = config_from_js(config)?;
        Ok(Self::open(
            MediaAsset::new(media_source, kind),
            ViewportSize::new(viewport_width, viewport_height),
            config,
        ))
    }

    /// Make `bytes` available under `uri` for export and image stickers.
    #[wasm_bindgen(js_name = registerAsset)]
    pub fn register_asset(&mut self, uri: String, bytes: Vec<u8>) {
        self.loader.insert(uri, bytes);
    }

    /// Register a TrueType/OpenType font under `family`.
    ///
    /// Text layers look up the families in their `font_family` list first;
    /// every registered font is a fallback for text and glyph stickers.
    #[wasm_bindgen(js_name = registerFont)]
    pub fn register_font(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), JsValue> {
        self.session_mut()?
            .register_font(family, bytes)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Current state as `{ state: "idle" | "drawing" | ..., layer?: number }`.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        let session = self.session()?;
        serde_wasm_bindgen::to_value(&session.state()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = activeTool)]
    pub fn active_tool(&self) -> Result<Option<String>, JsValue> {
        Ok(self.session()?.active_tool().map(tool_name))
    }

    /// Layers in render order, serialized for the host's DOM overlays.
    pub fn layers(&self) -> Result<JsValue, JsValue> {
        let session = self.session()?;
        serde_wasm_bindgen::to_value(session.layers()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // ---- decode ----

    #[wasm_bindgen(js_name = requestDecode)]
    pub fn request_decode(&mut self) -> Result<JsDecodeTicket, JsValue> {
        Ok(JsDecodeTicket::new(self.session_mut()?.request_decode()))
    }

    /// Decode `bytes` and install them as the base image.
    ///
    /// Fails for undecodable bytes and for stale tickets. Neither is fatal:
    /// export still falls back to the original media.
    #[wasm_bindgen(js_name = deliverDecoded)]
    pub fn deliver_decoded(&mut self, ticket: &JsDecodeTicket, bytes: &[u8]) -> Result<(), JsValue> {
        let image = decode_image(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.session_mut()?
            .deliver_decoded(ticket.ticket(), image)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // ---- tools and settings ----

    /// Toggle `"draw"`, `"text"`, `"sticker"` or `"filter"`.
    #[wasm_bindgen(js_name = activateTool)]
    pub fn activate_tool(&mut self, tool: &str) -> Result<(), JsValue> {
        let tool = Tool::parse(tool).ok_or_else(|| JsValue::from_str(&format!("Unknown tool: {tool}")))?;
        self.session_mut()?
            .activate_tool(tool)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Set the brush and text color from a `#rrggbb` string.
    #[wasm_bindgen(js_name = setColor)]
    pub fn set_color(&mut self, hex: &str) -> Result<(), JsValue> {
        let color = Color::from_hex(hex).ok_or_else(|| JsValue::from_str(&format!("Invalid color: {hex}")))?;
        self.session_mut()?.set_color(color);
        Ok(())
    }

    #[wasm_bindgen(js_name = setBrushSize)]
    pub fn set_brush_size(&mut self, size: f32) -> Result<(), JsValue> {
        self.session_mut()?.set_brush_size(size);
        Ok(())
    }

    #[wasm_bindgen(js_name = brushSize)]
    pub fn brush_size(&self) -> Result<f32, JsValue> {
        Ok(self.session()?.brush_size())
    }

    #[wasm_bindgen(js_name = selectFilter)]
    pub fn select_filter(&mut self, name: String) -> Result<(), JsValue> {
        self.session_mut()?.select_filter(name);
        Ok(())
    }

    // ---- pointer input ----

    /// Pointer pressed on the drawing surface, in surface pixels.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.session_mut()?.pointer_down(Point::new(x, y));
        Ok(())
    }

    /// Pointer moved over the drawing surface, in surface pixels.
    #[wasm_bindgen(js_name = pointerMoveSurface)]
    pub fn pointer_move_surface(&mut self, x: f64, y: f64) -> Result<(), JsValue> {
        self.session_mut()?.pointer_move_surface(Point::new(x, y));
        Ok(())
    }

    /// Pointer moved, in client coordinates, with the container's current
    /// bounding rect.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(
        &mut self,
        client_x: f64,
        client_y: f64,
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    ) -> Result<(), JsValue> {
        self.session_mut()?
            .pointer_move(Point::new(client_x, client_y), ClientRect::new(left, top, width, height));
        Ok(())
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> Result<(), JsValue> {
        self.session_mut()?.pointer_up();
        Ok(())
    }

    /// Topmost layer id under a viewport point.
    #[wasm_bindgen(js_name = layerAt)]
    pub fn layer_at(&self, x: f64, y: f64) -> Result<Option<f64>, JsValue> {
        Ok(self.session()?.layer_at(Point::new(x, y)).map(|id| id.0 as f64))
    }

    #[wasm_bindgen(js_name = grabLayer)]
    pub fn grab_layer(&mut self, id: f64) -> Result<(), JsValue> {
        self.session_mut()?
            .grab_layer(layer_id(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // ---- layers ----

    /// Commit text from the text tool. Returns the new layer id, or
    /// `undefined` when the text is blank.
    #[wasm_bindgen(js_name = commitText)]
    pub fn commit_text(&mut self, content: &str) -> Result<Option<f64>, JsValue> {
        self.session_mut()?
            .commit_text(content)
            .map(|id| id.map(|id| id.0 as f64))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = dismissPlacement)]
    pub fn dismiss_placement(&mut self) -> Result<(), JsValue> {
        self.session_mut()?
            .dismiss_placement()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Place a glyph sticker such as `"🎉"`.
    #[wasm_bindgen(js_name = pickGlyphSticker)]
    pub fn pick_glyph_sticker(&mut self, glyph: String) -> Result<f64, JsValue> {
        self.pick_sticker(StickerSource::Glyph(glyph))
    }

    /// Place an image sticker loaded from `uri`.
    #[wasm_bindgen(js_name = pickImageSticker)]
    pub fn pick_image_sticker(&mut self, uri: String) -> Result<f64, JsValue> {
        self.pick_sticker(StickerSource::Image(uri))
    }

    #[wasm_bindgen(js_name = setStickerTransform)]
    pub fn set_sticker_transform(&mut self, id: f64, size_unit: f64, rotation_deg: f64) -> Result<(), JsValue> {
        self.session_mut()?
            .set_sticker_transform(layer_id(id), size_unit, rotation_deg)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = deleteLayer)]
    pub fn delete_layer(&mut self, id: f64) -> Result<(), JsValue> {
        self.session_mut()?
            .delete_layer(layer_id(id))
            .map(|_| ())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // ---- output ----

    /// Render the live preview at viewport size.
    #[wasm_bindgen(js_name = renderPreview)]
    pub fn render_preview(&mut self) -> Result<JsRaster, JsValue> {
        let session = self.session.as_mut().ok_or_else(session_closed)?;
        Ok(JsRaster::from_rgba(session.render_preview(&self.loader)))
    }

    /// Export and close the session, calling `on_finish(uri)` once.
    ///
    /// `uri` is the composited JPEG data URI, or the original media URI for
    /// video and for any failed export.
    pub fn done(&mut self, on_finish: &Function) -> Result<(), JsValue> {
        let session = self.session.take().ok_or_else(session_closed)?;
        let uri = session.finish(&self.loader);
        on_finish.call1(&JsValue::NULL, &JsValue::from_str(&uri))?;
        Ok(())
    }

    /// Abandon the session and call `on_cancel()` once. Nothing is exported.
    pub fn cancel(&mut self, on_cancel: &Function) -> Result<(), JsValue> {
        let session = self.session.take().ok_or_else(session_closed)?;
        session.cancel();
        on_cancel.call0(&JsValue::NULL)?;
        Ok(())
    }
}

impl JsEditorSession {
    fn open(asset: MediaAsset, viewport: ViewportSize, config: EditorConfig) -> Self {
        Self {
            session: Some(EditorSession::new(asset, viewport, config)),
            loader: MemoryLoader::new(),
        }
    }

    fn session(&self) -> Result<&EditorSession, JsValue> {
        self.session.as_ref().ok_or_else(session_closed)
    }

    fn session_mut(&mut self) -> Result<&mut EditorSession, JsValue> {
        self.session.as_mut().ok_or_else(session_closed)
    }

    fn pick_sticker(&mut self, source: StickerSource) -> Result<f64, JsValue> {
        self.session_mut()?
            .pick_sticker(source)
            .map(|id| id.0 as f64)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn tool_name(tool: Tool) -> String {
    match tool {
        Tool::Draw => "draw",
        Tool::Text => "text",
        Tool::Sticker => "sticker",
        Tool::Filter => "filter",
    }
    .to_string()
}

/// Layer ids cross the boundary as JS numbers.
fn layer_id(id: f64) -> LayerId {
    LayerId(id as u64)
}


/// WASM-specific tests that require JsValue.
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn recorder() -> (Function, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            sink.borrow_mut().push(value.as_string().unwrap_or_default());
        });
        let function: Function = closure.as_ref().unchecked_ref::<Function>().clone();
        closure.forget();
        (function, calls)
    }

    #[wasm_bindgen_test]
    fn test_constructor_accepts_partial_config() {
        let config = js_sys::JSON::parse(r#"{"export_quality": 70}"#).unwrap();
        assert!(JsEditorSession::new("blob:x".into(), "image", 10, 10, config).is_ok());
        assert!(JsEditorSession::new("blob:x".into(), "image", 10, 10, JsValue::UNDEFINED).is_ok());
    }

    #[wasm_bindgen_test]
    fn test_constructor_rejects_inverted_brush_range() {
        let config = js_sys::JSON::parse(r#"{"min_brush_size": 30}"#).unwrap();
        assert!(JsEditorSession::new("blob:x".into(), "image", 10, 10, config).is_err());
    }

    #[wasm_bindgen_test]
    fn test_bad_font_rejected() {
        let mut editor = JsEditorSession::new("blob:x".into(), "image", 10, 10, JsValue::NULL).unwrap();
        assert!(editor.register_font("Broken", vec![1, 2, 3]).is_err());
    }

    #[wasm_bindgen_test]
    fn test_unknown_media_kind_rejected() {
        assert!(JsEditorSession::new("blob:x".into(), "audio", 10, 10, JsValue::UNDEFINED).is_err());
    }

    #[wasm_bindgen_test]
    fn test_video_finishes_with_source_once() {
        let mut editor = JsEditorSession::new("blob:clip".into(), "video", 10, 10, JsValue::NULL).unwrap();
        let (on_finish, calls) = recorder();
        editor.done(&on_finish).unwrap();
        assert!(editor.done(&on_finish).is_err());
        assert_eq!(*calls.borrow(), vec!["blob:clip".to_string()]);
    }

    #[wasm_bindgen_test]
    fn test_unloadable_image_falls_back_to_source() {
        let mut editor = JsEditorSession::new("blob:missing".into(), "image", 10, 10, JsValue::NULL).unwrap();
        let (on_finish, calls) = recorder();
        editor.done(&on_finish).unwrap();
        assert_eq!(*calls.borrow(), vec!["blob:missing".to_string()]);
    }

    #[wasm_bindgen_test]
    fn test_cancel_closes_session() {
        let mut editor = JsEditorSession::new("blob:x".into(), "image", 10, 10, JsValue::NULL).unwrap();
        let (on_cancel, calls) = recorder();
        editor.cancel(&on_cancel).unwrap();
        assert_eq!(calls.borrow().len(), 1);
        assert!(!editor.is_open());
        assert!(editor.activate_tool("draw").is_err());
    }

    #[wasm_bindgen_test]
    fn test_layers_serialize() {
        let mut editor = JsEditorSession::new("blob:x".into(), "image", 100, 100, JsValue::NULL).unwrap();
        editor.activate_tool("text").unwrap();
        editor.commit_text("hello").unwrap();
        let layers = editor.layers().unwrap();
        assert_eq!(js_sys::Array::from(&layers).length(), 1);
    }
}
