//! Picker data and filter thumbnails for the editor toolbar.

use storykit_core::filter::{apply_filter, resolve, CATALOG};
use storykit_core::image::imageops::{self, FilterType};
use storykit_core::layer::STICKER_GLYPHS;
use storykit_core::PALETTE;
use wasm_bindgen::prelude::*;

use crate::types::JsRaster;

/// The filter catalog as `[{ name, expression }]`, in display order.
#[wasm_bindgen(js_name = filterCatalog)]
pub fn filter_catalog() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&CATALOG[..]).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Glyphs offered by the sticker picker.
#[wasm_bindgen(js_name = stickerGlyphs)]
pub fn sticker_glyphs() -> Vec<String> {
    STICKER_GLYPHS.iter().map(|glyph| glyph.to_string()).collect()
}

/// Brush swatches as `#rrggbb` strings.
#[wasm_bindgen]
pub fn palette() -> Vec<String> {
    PALETTE.iter().map(|color| color.to_hex()).collect()
}

/// Render a filter thumbnail from a preview frame.
///
/// The frame is first shrunk so its longer edge is at most `max_edge`.
#[wasm_bindgen(js_name = filterThumbnail)]
pub fn filter_thumbnail(frame: &JsRaster, filter_name: &str, max_edge: u32) -> Result<JsRaster, JsValue> {
    let spec = resolve(filter_name).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let image = frame
        .to_rgba()
        .ok_or_else(|| JsValue::from_str("Pixel buffer does not match frame size"))?;

    let mut thumb = shrink_to_fit(image, max_edge);
    apply_filter(&mut thumb, &spec).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(JsRaster::from_rgba(thumb))
}

fn shrink_to_fit(image: storykit_core::RgbaImage, max_edge: u32) -> storykit_core::RgbaImage {
    let (w, h) = image.dimensions();
    let longest = w.max(h);
    if max_edge == 0 || longest <= max_edge {
        return image;
    }
    let scale = max_edge as f64 / longest as f64;
    let tw = ((w as f64 * scale).round() as u32).max(1);
    let th = ((h as f64 * scale).round() as u32).max(1);
    imageops::resize(&image, tw, th, FilterType::Triangle)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_catalog_serializes_all_entries() {
        let catalog = filter_catalog().unwrap();
        assert_eq!(js_sys::Array::from(&catalog).length(), 8);
    }

    #[wasm_bindgen_test]
    fn test_unknown_filter_rejected() {
        let frame = JsRaster::from_rgba(storykit_core::RgbaImage::new(2, 2));
        assert!(filter_thumbnail(&frame, "Nope", 2).is_err());
    }
}
