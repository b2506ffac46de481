//! StoryKit WASM - WebAssembly bindings for StoryKit
//!
//! This crate exposes the storykit-core editor and cropper sessions to a
//! browser host. The host owns the DOM and media acquisition; these bindings
//! own session state, rendering, and export.
//!
//! # Module Structure
//!
//! - `editor` - `JsEditorSession`: tools, pointer input, layers, fonts, `done`/`cancel`
//! - `cropper` - `JsCropperSession`: pan/zoom/rotate, `apply`/`cancel`
//! - `filter` - filter catalog, sticker glyphs, palette, filter thumbnails
//! - `logging` - `tracing` output to the browser console
//! - `types` - `JsRaster` frames and decode tickets
//!
//! # Usage
//!
//! ```typescript
//! import init, { initLogging, JsCropperSession, JsEditorSession } from '@storykit/wasm';
//!
//! await init();
//! initLogging('debug');
//!
//! const cropper = new JsCropperSession(photoUri, 400, undefined);
//! cropper.deliverDecoded(cropper.requestDecode(), photoBytes);
//! cropper.apply((croppedUri) => {
//!   const editor = new JsEditorSession(croppedUri, 'image', 400, 711, undefined);
//!   // ...
//!   editor.done((finalUri) => post(finalUri));
//! });
//! ```

use wasm_bindgen::prelude::*;

mod cropper;
mod editor;
mod filter;
mod logging;
mod types;

// Re-export public types
pub use cropper::JsCropperSession;
pub use editor::JsEditorSession;
pub use filter::{filter_catalog, filter_thumbnail, palette, sticker_glyphs};
pub use logging::init_logging;
pub use types::{JsDecodeTicket, JsRaster};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logging::init_logging(logging::DEFAULT_DIRECTIVE);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
