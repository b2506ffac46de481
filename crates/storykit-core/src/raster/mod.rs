//! Software rendering primitives shared by the compositor, the live editor
//! preview and the cropper.
//!
//! All drawing targets are straight-alpha `image::RgbaImage`s. Every routine is
//! deterministic: identical inputs produce identical pixels.
//!
//! # Coordinate System
//!
//! Pixel `(x, y)` covers the square `[x, x+1) x [y, y+1)`; sampling happens at
//! pixel centers `(x + 0.5, y + 0.5)`.

mod blend;
mod draw;
mod surface;
mod text;

pub use blend::blend_pixel;
pub use draw::{draw_image_stretched, draw_image_transformed, sample_bilinear};
pub use surface::DrawingSurface;
pub use text::{draw_text, measure_text, render_glyph_tile, FontBook, FontError, TextStyle};
