//! Overlay layers placed on top of the base media.
//!
//! Text and sticker layers stay individually movable and deletable until
//! export. Freehand strokes are not layers: they are rasterized straight into
//! the session's [`DrawingSurface`](crate::raster::DrawingSurface) and render
//! beneath every layer.
//!
//! Rendering order is insertion order. There is no independent z-index and no
//! reordering.

use serde::{Deserialize, Serialize};

use crate::geometry::UnitPoint;
use crate::Color;

/// Glyphs offered by the sticker picker.
pub const STICKER_GLYPHS: [&str; 16] = [
    "😀", "😂", "😍", "😎", "😭", "😡", "👍", "👎", "🎉", "🔥", "❤️", "💔", "🍕", "🍔", "🍺", "☕",
];

/// Session-unique layer identifier.
///
/// Issued by a per-session counter, so ids are strictly increasing in
/// creation order and never collide within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub content: String,
    pub color: Color,
    /// Font size on a 1080-pixel-wide reference canvas.
    pub font_size_px: f32,
    pub font_family: String,
}

/// Where a sticker's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum StickerSource {
    /// A character sequence rasterized with the built-in glyph set.
    Glyph(String),
    /// An image URI resolved through an [`AssetLoader`](crate::decode::AssetLoader).
    Image(String),
}

/// Image sticker overlay, drawn as a square centered on its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickerLayer {
    pub source: StickerSource,
    /// Side length as a fraction of canvas width.
    pub size_unit: f64,
    pub rotation_deg: f64,
}

/// Variant payload of an overlay layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LayerKind {
    Text(TextLayer),
    Sticker(StickerLayer),
}

/// A positioned overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayLayer {
    pub id: LayerId,
    pub position: UnitPoint,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl OverlayLayer {
    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.kind {
            LayerKind::Text(text) => Some(text),
            LayerKind::Sticker(_) => None,
        }
    }

    pub fn as_sticker(&self) -> Option<&StickerLayer> {
        match &self.kind {
            LayerKind::Sticker(sticker) => Some(sticker),
            LayerKind::Text(_) => None,
        }
    }
}

/// Ordered set of overlay layers for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<OverlayLayer>,
    next_id: u64,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer on top of all existing ones and return its id.
    pub fn push(&mut self, position: UnitPoint, kind: LayerKind) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.push(OverlayLayer { id, position, kind });
        id
    }

    pub fn get(&self, id: LayerId) -> Option<&OverlayLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut OverlayLayer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    /// Move a layer. Returns false if no such layer exists.
    pub fn move_to(&mut self, id: LayerId, position: UnitPoint) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.position = position;
                true
            }
            None => false,
        }
    }

    /// Remove a layer, preserving the order of the rest.
    pub fn remove(&mut self, id: LayerId) -> Option<OverlayLayer> {
        let index = self.layers.iter().position(|layer| layer.id == id)?;
        Some(self.layers.remove(index))
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    /// Layers bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &OverlayLayer> {
        self.layers.iter()
    }

    pub fn as_slice(&self) -> &[OverlayLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
