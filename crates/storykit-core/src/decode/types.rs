//! Core types for media decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for media loading and decoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a recognized image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image data is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The loader has nothing registered for this URI.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// A `data:` URI is malformed.
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
}

/// Kind of the base media of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    /// Passed through unedited.
    Video,
}

impl MediaKind {
    /// Parse `"image"` / `"video"` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Immutable reference to the base media of a session.
///
/// Native dimensions are unknown until the media has been decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub source_uri: String,
    pub kind: MediaKind,
    /// Native `(width, height)` in pixels, once known.
    pub dimensions: Option<(u32, u32)>,
}

impl MediaAsset {
    pub fn new(source_uri: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            source_uri: source_uri.into(),
            kind,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Normal = 1,
    FlipHorizontal = 2,
    Rotate180 = 3,
    FlipVertical = 4,
    /// Flip horizontal + rotate 270 CW.
    Transpose = 5,
    Rotate90CW = 6,
    /// Flip horizontal + rotate 90 CW.
    Transverse = 7,
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}
