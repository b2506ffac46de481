//! Cropper session bindings.
//!
//! # Example
//!
//! ```typescript
//! import { JsCropperSession } from '@storykit/wasm';
//!
//! const cropper = new JsCropperSession(uri, container.clientWidth, undefined);
//! cropper.deliverDecoded(cropper.requestDecode(), bytes);
//!
//! viewport.onpointermove = (e) => { cropper.pointerMove(e.clientX, e.clientY); paint(cropper.render()); };
//! applyButton.onclick = () => cropper.apply((croppedUri) => openEditor(croppedUri));
//! ```

use js_sys::Function;
use storykit_core::decode::decode_image;
use storykit_core::kurbo::Point;
use storykit_core::{CropperConfig, CropperSession};
use wasm_bindgen::prelude::*;

use crate::types::{config_from_js, session_closed, JsDecodeTicket, JsRaster};

/// Square pan/zoom/rotate crop, closed by exactly one of `apply()` or
/// `cancel()`.
#[wasm_bindgen]
pub struct JsCropperSession {
    session: Option<CropperSession>,
}

#[wasm_bindgen]
impl JsCropperSession {
    /// # Arguments
    ///
    /// * `source_uri` - URI of the image being cropped
    /// * `container_width` - width of the hosting element; the viewport side
    ///   is this, capped by `max_viewport_px`
    /// * `config` - optional partial `CropperConfig` object
    #[wasm_bindgen(constructor)]
    pub fn new(source_uri: String, container_width: f64, config: JsValue) -> Result<JsCropperSession, JsValue> {
        let config: CropperConfig = config_from_js(config)?;
        Ok(Self::open(source_uri, container_width, config))
    }

    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Viewport side in pixels, or 0 once closed.
    #[wasm_bindgen(getter)]
    pub fn side(&self) -> u32 {
        self.session.as_ref().map_or(0, CropperSession::side)
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.session.as_ref().map_or(1.0, |s| s.transform().zoom)
    }

    #[wasm_bindgen(getter, js_name = rotationDeg)]
    pub fn rotation_deg(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| s.transform().rotation_deg)
    }

    #[wasm_bindgen(js_name = requestDecode)]
    pub fn request_decode(&mut self) -> Result<JsDecodeTicket, JsValue> {
        Ok(JsDecodeTicket::new(self.session_mut()?.request_decode()))
    }

    #[wasm_bindgen(js_name = deliverDecoded)]
    pub fn deliver_decoded(&mut self, ticket: &JsDecodeTicket, bytes: &[u8]) -> Result<(), JsValue> {
        let image = decode_image(bytes).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.session_mut()?
            .deliver_decoded(ticket.ticket(), image)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, client_x: f64, client_y: f64) -> Result<(), JsValue> {
        self.session_mut()?.pointer_down(Point::new(client_x, client_y));
        Ok(())
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) -> Result<(), JsValue> {
        self.session_mut()?.pointer_move(Point::new(client_x, client_y));
        Ok(())
    }

    /// Pointer released or left the viewport.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self) -> Result<(), JsValue> {
        self.session_mut()?.pointer_up();
        Ok(())
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> Result<(), JsValue> {
        self.session_mut()?.zoom_in();
        Ok(())
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> Result<(), JsValue> {
        self.session_mut()?.zoom_out();
        Ok(())
    }

    /// Slider input. Clamped to the configured zoom range.
    #[wasm_bindgen(js_name = setZoom)]
    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), JsValue> {
        self.session_mut()?.set_zoom(zoom);
        Ok(())
    }

    pub fn rotate(&mut self) -> Result<(), JsValue> {
        self.session_mut()?.rotate();
        Ok(())
    }

    /// The viewport as currently displayed.
    pub fn render(&self) -> Result<JsRaster, JsValue> {
        let session = self.session.as_ref().ok_or_else(session_closed)?;
        Ok(JsRaster::from_rgba(session.render()))
    }

    /// Rasterize the viewport and call `on_crop(uri)` once with a JPEG data
    /// URI.
    pub fn apply(&mut self, on_crop: &Function) -> Result<(), JsValue> {
        let session = self.session.take().ok_or_else(session_closed)?;
        let uri = session.apply().map_err(|e| JsValue::from_str(&e.to_string()))?;
        on_crop.call1(&JsValue::NULL, &JsValue::from_str(&uri))?;
        Ok(())
    }

    /// Discard the crop and call `on_cancel()` once.
    pub fn cancel(&mut self, on_cancel: &Function) -> Result<(), JsValue> {
        let session = self.session.take().ok_or_else(session_closed)?;
        session.cancel();
        on_cancel.call0(&JsValue::NULL)?;
        Ok(())
    }
}

impl JsCropperSession {
    fn open(source_uri: String, container_width: f64, config: CropperConfig) -> Self {
        Self {
            session: Some(CropperSession::new(source_uri, container_width, config)),
        }
    }

    fn session_mut(&mut self) -> Result<&mut CropperSession, JsValue> {
        self.session.as_mut().ok_or_else(session_closed)
    }
}
