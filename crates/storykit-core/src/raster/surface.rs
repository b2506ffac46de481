//! Persistent freehand drawing buffer.
//!
//! Strokes are rasterized the moment they are drawn; nothing about the path
//! is kept afterwards. The buffer has the displayed preview's dimensions for
//! its whole lifetime and is stretched onto the export canvas.

use image::RgbaImage;
use kurbo::{Point, Vec2};

use super::blend_pixel;
use crate::geometry::ViewportSize;
use crate::Color;

/// Transparent raster that accumulates round-capped strokes.
#[derive(Debug, Clone)]
pub struct DrawingSurface {
    image: RgbaImage,
    /// Last point of the open path, if a path is open.
    pen: Option<Point>,
}

impl DrawingSurface {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
            pen: None,
        }
    }

    pub fn size(&self) -> ViewportSize {
        ViewportSize::new(self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// True if nothing has been drawn yet.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    pub fn has_open_path(&self) -> bool {
        self.pen.is_some()
    }

    /// Start a new path at `at`. Nothing is drawn until the path extends.
    pub fn begin_path(&mut self, at: Point) {
        self.pen = Some(at);
    }

    /// Extend the open path to `to`, stroking the new segment immediately.
    ///
    /// Ignored when no path is open.
    pub fn line_to(&mut self, to: Point, color: Color, width: f64) {
        if let Some(from) = self.pen {
            self.stroke_segment(from, to, color, width);
            self.pen = Some(to);
        }
    }

    pub fn end_path(&mut self) {
        self.pen = None;
    }

    /// Stroke a straight segment with round caps and a one-pixel antialiased edge.
    pub fn stroke_segment(&mut self, from: Point, to: Point, color: Color, width: f64) {
        let radius = width / 2.0;
        if radius <= 0.0 || !radius.is_finite() {
            return;
        }
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return;
        }

        let reach = radius + 1.0;
        let x_start = (from.x.min(to.x) - reach).floor().max(0.0) as u32;
        let y_start = (from.y.min(to.y) - reach).floor().max(0.0) as u32;
        let x_end = ((from.x.max(to.x) + reach).ceil().min(w as f64)).max(0.0) as u32;
        let y_end = ((from.y.max(to.y) + reach).ceil().min(h as f64)).max(0.0) as u32;

        let rgba = color.to_array();
        for y in y_start..y_end {
            for x in x_start..x_end {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let d = distance_to_segment(center, from, to);
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0) as f32;
                if coverage > 0.0 {
                    blend_pixel(self.image.get_pixel_mut(x, y), rgba, coverage);
                }
            }
        }
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab: Vec2 = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);

    #[test]
    fn test_new_surface_is_blank() {
        let surface = DrawingSurface::new(ViewportSize::new(20, 10));
        assert!(surface.is_blank());
        assert_eq!(surface.size(), ViewportSize::new(20, 10));
    }

    #[test]
    fn test_begin_without_move_draws_nothing() {
        let mut surface = DrawingSurface::new(ViewportSize::new(20, 20));
        surface.begin_path(Point::new(10.0, 10.0));
        surface.end_path();
        assert!(surface.is_blank());
    }

    #[test]
    fn test_line_to_strokes_immediately() {
        let mut surface = DrawingSurface::new(ViewportSize::new(20, 20));
        surface.begin_path(Point::new(2.0, 10.0));
        surface.line_to(Point::new(18.0, 10.0), RED, 4.0);

        assert_eq!(surface.image().get_pixel(10, 9).0, [255, 0, 0, 255]);
        assert_eq!(surface.image().get_pixel(10, 2).0[3], 0);
    }

    #[test]
    fn test_round_caps_extend_past_endpoints() {
        let mut surface = DrawingSurface::new(ViewportSize::new(30, 30));
        surface.begin_path(Point::new(10.0, 15.0));
        surface.line_to(Point::new(20.0, 15.0), RED, 6.0);

        // Two pixels beyond the start point, still inside the cap.
        assert_eq!(surface.image().get_pixel(8, 14).0, [255, 0, 0, 255]);
        // Well beyond the cap.
        assert_eq!(surface.image().get_pixel(4, 14).0[3], 0);
    }

    #[test]
    fn test_line_to_without_path_is_ignored() {
        let mut surface = DrawingSurface::new(ViewportSize::new(20, 20));
        surface.line_to(Point::new(18.0, 10.0), RED, 4.0);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_end_path_closes() {
        let mut surface = DrawingSurface::new(ViewportSize::new(20, 20));
        surface.begin_path(Point::new(1.0, 1.0));
        assert!(surface.has_open_path());
        surface.end_path();
        assert!(!surface.has_open_path());
    }

    #[test]
    fn test_stroke_off_surface_is_clipped() {
        let mut surface = DrawingSurface::new(ViewportSize::new(10, 10));
        surface.stroke_segment(Point::new(-20.0, -20.0), Point::new(-10.0, -10.0), RED, 4.0);
        assert!(surface.is_blank());
        surface.stroke_segment(Point::new(-5.0, 5.0), Point::new(15.0, 5.0), RED, 2.0);
        assert!(!surface.is_blank());
    }

    #[test]
    fn test_distance_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        assert!((distance_to_segment(Point::new(-3.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        assert!((distance_to_segment(Point::new(1.0, 1.0), a, a) - 2f64.sqrt()).abs() < 1e-12);
    }
}
