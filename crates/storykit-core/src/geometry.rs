//! Resolution-independent coordinates.
//!
//! Layers are placed in *unit space*: each axis runs from 0.0 to 1.0 across
//! the canvas the user edited on, so the same position can be projected onto
//! the (generally larger) native export resolution.
//!
//! # Coordinate System
//!
//! - (0.0, 0.0) = top-left corner
//! - (1.0, 1.0) = bottom-right corner
//! - Values outside 0..1 are legal and are never clamped here: a layer dragged
//!   partially off-screen keeps its out-of-range coordinate and renders
//!   partially visible (or not at all) at export.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Convert a pixel coordinate along one axis to unit space.
///
/// A zero-length viewport maps every coordinate to 0.0.
#[inline]
pub fn to_unit(px: f64, viewport_len: f64) -> f64 {
    if viewport_len == 0.0 {
        return 0.0;
    }
    px / viewport_len
}

/// Convert a unit coordinate along one axis to pixels on a target of the given length.
#[inline]
pub fn from_unit(unit: f64, target_len: f64) -> f64 {
    unit * target_len
}

/// A point in unit space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPoint {
    pub x: f64,
    pub y: f64,
}

impl UnitPoint {
    /// Canvas center, the default placement for new text and stickers.
    pub const CENTER: UnitPoint = UnitPoint { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Normalize raw client coordinates against a container's bounding box.
    ///
    /// The rect is expected to be measured at the time of the event; callers
    /// must not cache it across moves.
    pub fn from_client(client: Point, container: ClientRect) -> Self {
        Self {
            x: to_unit(client.x - container.left, container.width),
            y: to_unit(client.y - container.top, container.height),
        }
    }

    /// Project onto a target surface in pixels.
    pub fn to_pixels(self, target_width: f64, target_height: f64) -> Point {
        Point::new(
            from_unit(self.x, target_width),
            from_unit(self.y, target_height),
        )
    }
}

impl Default for UnitPoint {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Pixel dimensions of a display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Bounding box of a container element in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_unit_basic() {
        assert!((to_unit(200.0, 400.0) - 0.5).abs() < 1e-12);
        assert!((to_unit(0.0, 400.0)).abs() < 1e-12);
    }

    #[test]
    fn test_to_unit_zero_viewport() {
        assert_eq!(to_unit(50.0, 0.0), 0.0);
    }

    #[test]
    fn test_out_of_range_not_clamped() {
        assert!((to_unit(-40.0, 400.0) + 0.1).abs() < 1e-12);
        assert!((to_unit(600.0, 400.0) - 1.5).abs() < 1e-12);
        assert!((from_unit(-0.1, 1000.0) + 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_client_uses_container_offset() {
        let rect = ClientRect::new(100.0, 50.0, 400.0, 200.0);
        let p = UnitPoint::from_client(Point::new(300.0, 100.0), rect);
        assert!((p.x - 0.5).abs() < 1e-12);
        assert!((p.y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_to_pixels_scales_to_target() {
        let p = UnitPoint::new(0.25, 0.75);
        let px = p.to_pixels(4000.0, 3000.0);
        assert!((px.x - 1000.0).abs() < 1e-9);
        assert!((px.y - 2250.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_is_center() {
        assert_eq!(UnitPoint::default(), UnitPoint::new(0.5, 0.5));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
