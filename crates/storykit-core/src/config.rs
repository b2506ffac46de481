//! Tunable constants for editor and cropper sessions.
//!
//! Both configs deserialize with every field optional, so a host can override
//! a single value and keep the defaults for the rest. Deserialization only
//! checks types; call `validate` before handing a host-supplied config to a
//! session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Color;

/// A config value outside its usable range.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{min_field} ({min}) is greater than {max_field} ({max})")]
    InvertedRange {
        min_field: &'static str,
        min: f64,
        max_field: &'static str,
        max: f64,
    },

    #[error("{field} must be between 1 and 100, got {value}")]
    Quality { field: &'static str, value: u8 },
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn ordered(min_field: &'static str, min: f64, max_field: &'static str, max: f64) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange {
            min_field,
            min,
            max_field,
            max,
        })
    }
}

fn quality(field: &'static str, value: u8) -> Result<(), ConfigError> {
    if (1..=100).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Quality { field, value })
    }
}

/// Configuration for an [`EditorSession`](crate::editor::EditorSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of the reference canvas text sizes are defined against.
    pub reference_width: f64,
    /// Font size for newly committed text, in reference pixels.
    pub text_font_size_px: f32,
    /// Font family recorded on new text layers.
    pub font_family: String,
    /// Initial brush and text color.
    pub default_color: Color,
    /// Initial brush width in drawing-surface pixels.
    pub default_brush_size: f32,
    /// Smallest allowed brush width.
    pub min_brush_size: f32,
    /// Largest allowed brush width.
    pub max_brush_size: f32,
    /// Side length of a new sticker as a fraction of canvas width.
    pub sticker_size_unit: f64,
    /// Color of the legibility outline drawn under text.
    pub text_outline_color: Color,
    /// JPEG quality of the exported composite (1-100).
    pub export_quality: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            reference_width: 1080.0,
            text_font_size_px: 24.0,
            font_family: "Inter, sans-serif".to_string(),
            default_color: Color::WHITE,
            default_brush_size: 5.0,
            min_brush_size: 2.0,
            max_brush_size: 20.0,
            sticker_size_unit: 0.25,
            text_outline_color: Color::BLACK,
            export_quality: 85,
        }
    }
}

impl EditorConfig {
    /// Check every field is usable.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("reference_width", self.reference_width)?;
        positive("text_font_size_px", self.text_font_size_px as f64)?;
        positive("min_brush_size", self.min_brush_size as f64)?;
        positive("max_brush_size", self.max_brush_size as f64)?;
        ordered(
            "min_brush_size",
            self.min_brush_size as f64,
            "max_brush_size",
            self.max_brush_size as f64,
        )?;
        positive("default_brush_size", self.default_brush_size as f64)?;
        positive("sticker_size_unit", self.sticker_size_unit)?;
        quality("export_quality", self.export_quality)
    }

    /// Clamp a requested brush width to the configured range.
    ///
    /// An inverted range resolves to `max_brush_size`.
    pub fn clamp_brush_size(&self, size: f32) -> f32 {
        size.max(self.min_brush_size).min(self.max_brush_size)
    }

    /// Factor from reference-canvas text sizes to a canvas `target_width`
    /// pixels wide. 1.0 when `reference_width` is unusable.
    pub fn text_scale(&self, target_width: f64) -> f64 {
        if self.reference_width.is_finite() && self.reference_width > 0.0 {
            target_width / self.reference_width
        } else {
            1.0
        }
    }
}

/// Configuration for a [`CropperSession`](crate::cropper::CropperSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropperConfig {
    /// Largest side of the square crop viewport in pixels.
    pub max_viewport_px: u32,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom change per zoom-in / zoom-out action.
    pub zoom_step: f64,
    /// Rotation change per rotate action, in degrees.
    pub rotation_step_deg: f64,
    /// JPEG quality of the cropped output (1-100).
    pub output_quality: u8,
}

impl CropperConfig {
    /// Check every field is usable.
    ///
    /// # Errors
    ///
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_viewport_px", self.max_viewport_px as f64)?;
        positive("min_zoom", self.min_zoom)?;
        positive("max_zoom", self.max_zoom)?;
        ordered("min_zoom", self.min_zoom, "max_zoom", self.max_zoom)?;
        positive("zoom_step", self.zoom_step)?;
        if !self.rotation_step_deg.is_finite() {
            return Err(ConfigError::NotFinite {
                field: "rotation_step_deg",
                value: self.rotation_step_deg,
            });
        }
        quality("output_quality", self.output_quality)
    }
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            max_viewport_px: 400,
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_step: 0.1,
            rotation_step_deg: 90.0,
            output_quality: 90,
        }
    }
}
