//! WASM-compatible wrapper types shared by the session bindings.

use serde::de::DeserializeOwned;
use storykit_core::decode::DecodeTicket;
use storykit_core::{ConfigError, CropperConfig, EditorConfig, RgbaImage};
use wasm_bindgen::prelude::*;

/// An RGBA frame handed to JavaScript.
///
/// The layout matches `ImageData`: 4 bytes per pixel, row-major, straight
/// alpha. Hosts can paint it with
/// `ctx.putImageData(new ImageData(new Uint8ClampedArray(frame.pixels()), frame.width), 0, 0)`.
#[wasm_bindgen]
pub struct JsRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRaster {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4).
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as a Uint8Array copy.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsRaster {
    pub(crate) fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Borrow back as a core image. `None` if the buffer length is off.
    pub(crate) fn to_rgba(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}

/// Opaque handle for one pending decode.
///
/// Returned by `requestDecode()` and passed back with the decoded bytes.
/// A handle from another session, or one superseded by a newer request, is
/// rejected on delivery.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct JsDecodeTicket {
    inner: DecodeTicket,
}

#[wasm_bindgen]
impl JsDecodeTicket {
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.inner.generation as f64
    }
}

impl JsDecodeTicket {
    pub(crate) fn new(inner: DecodeTicket) -> Self {
        Self { inner }
    }

    pub(crate) fn ticket(&self) -> DecodeTicket {
        self.inner
    }
}

/// A session config the host may pass as a plain object.
pub(crate) trait HostConfig: DeserializeOwned + Default {
    fn validate(&self) -> Result<(), ConfigError>;
}

impl HostConfig for EditorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        EditorConfig::validate(self)
    }
}

impl HostConfig for CropperConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        CropperConfig::validate(self)
    }
}

fn checked<T: HostConfig>(config: T) -> Result<T, ConfigError> {
    config.validate()?;
    Ok(config)
}

/// Deserialize and validate an optional config object. `undefined` and
/// `null` give the defaults; missing fields fall back individually.
pub(crate) fn config_from_js<T: HostConfig>(value: JsValue) -> Result<T, JsValue> {
    let config = if value.is_undefined() || value.is_null() {
        T::default()
    } else {
        serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    checked(config).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Error for calls made after `done()` or `cancel()`.
pub(crate) fn session_closed() -> JsValue {
    JsValue::from_str("Session already closed")
}
