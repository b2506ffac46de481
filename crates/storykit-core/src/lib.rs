//! StoryKit Core - Layered media compositing engine
//!
//! This crate turns a captured photo plus user-added overlays (freehand
//! strokes, text, stickers, a tone filter) into one flattened raster, and
//! provides the square crop/zoom/rotate stage that can precede editing.

pub mod compose;
pub mod config;
pub mod cropper;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod filter;
pub mod geometry;
pub mod layer;
pub mod raster;
pub mod transform;

pub use compose::{compose, compose_media, ComposeError};
pub use config::{ConfigError, CropperConfig, EditorConfig};
pub use cropper::CropperSession;
pub use decode::{AssetLoader, DecodeError, MediaAsset, MediaKind};
pub use editor::{EditorError, EditorSession, EditorState, Tool};
pub use filter::{FilterError, FilterSpec};
pub use geometry::{ClientRect, UnitPoint, ViewportSize};
pub use layer::{LayerId, LayerKind, LayerStack, OverlayLayer, StickerSource};
pub use raster::{FontBook, FontError};
pub use transform::CropTransform;

// Crates that appear in the public API.
pub use image::{self, Rgba, RgbaImage};
pub use kurbo;

use serde::{Deserialize, Serialize};

/// Swatches offered by the brush and text tools.
pub const PALETTE: [Color; 5] = [
    Color::rgb(0xff, 0xff, 0xff),
    Color::rgb(0xff, 0x00, 0x00),
    Color::rgb(0x00, 0xff, 0x00),
    Color::rgb(0x00, 0x00, 0xff),
    Color::rgb(0xff, 0xff, 0x00),
];

/// An sRGB color with straight alpha.
///
/// Serializes as a `#rrggbb` / `#rrggbbaa` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 0xff {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("Invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#ff0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(
            Color::from_hex("#00000080"),
            Some(Color::rgba(0, 0, 0, 0x80))
        );
    }

    #[test]
    fn test_color_from_hex_invalid() {
        assert_eq!(Color::from_hex("#ff00"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
        assert_eq!(Color::from_hex(""), None);
        assert_eq!(Color::from_hex("#ééé"), None);
    }

    #[test]
    fn test_color_to_hex() {
        assert_eq!(Color::rgb(255, 255, 0).to_hex(), "#ffff00");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn test_palette_starts_with_white() {
        assert_eq!(PALETTE[0], Color::WHITE);
        assert_eq!(PALETTE.len(), 5);
    }
}
