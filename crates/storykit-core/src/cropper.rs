//! Square crop stage that can precede editing.
//!
//! The user pans by dragging, zooms with buttons or a slider, and rotates in
//! quarter turns. Applying rasterizes the viewport exactly as displayed; there
//! is no re-render at the source's native resolution.

use image::RgbaImage;
use kurbo::{Point, Vec2};

use crate::config::CropperConfig;
use crate::decode::{DecodeSlot, DecodeTicket, StaleDecode};
use crate::encode::{encode_data_uri, EncodeError};
use crate::transform::{render_crop_viewport, CropTransform};

/// Interactive crop of one source image.
#[derive(Debug)]
pub struct CropperSession {
    source_uri: String,
    config: CropperConfig,
    side: u32,
    transform: CropTransform,
    /// `client - offset` at pointer down, while a pan is in progress.
    drag_anchor: Option<Vec2>,
    source: Option<RgbaImage>,
    decode: DecodeSlot,
}

impl CropperSession {
    /// Start a crop. The viewport is as wide as the container, up to the
    /// configured maximum.
    pub fn new(source_uri: impl Into<String>, container_width: f64, config: CropperConfig) -> Self {
        let fitted = if container_width.is_finite() && container_width >= 1.0 {
            (container_width as u32).min(config.max_viewport_px)
        } else {
            config.max_viewport_px
        };
        let side = fitted.max(1);

        let decode = DecodeSlot::new();
        tracing::debug!(session = decode.session(), side, "Cropper session started");

        Self {
            source_uri: source_uri.into(),
            config,
            side,
            transform: CropTransform::new(),
            drag_anchor: None,
            source: None,
            decode,
        }
    }

    pub fn id(&self) -> u64 {
        self.decode.session()
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    /// Viewport side length in pixels.
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn transform(&self) -> &CropTransform {
        &self.transform
    }

    pub fn is_panning(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    pub fn request_decode(&mut self) -> DecodeTicket {
        self.decode.request()
    }

    pub fn deliver_decoded(&mut self, ticket: DecodeTicket, image: RgbaImage) -> Result<(), StaleDecode> {
        self.decode.accept(ticket)?;
        self.source = Some(image);
        Ok(())
    }

    pub fn pointer_down(&mut self, client: Point) {
        self.drag_anchor = Some(client.to_vec2() - self.transform.offset);
    }

    pub fn pointer_move(&mut self, client: Point) {
        if let Some(anchor) = self.drag_anchor {
            self.transform.set_offset(client.to_vec2() - anchor);
        }
    }

    /// Pointer released or left the viewport.
    pub fn pointer_up(&mut self) {
        self.drag_anchor = None;
    }

    pub fn zoom_in(&mut self) {
        self.transform.zoom_in(&self.config);
    }

    pub fn zoom_out(&mut self) {
        self.transform.zoom_out(&self.config);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.transform.set_zoom(zoom, &self.config);
    }

    pub fn rotate(&mut self) {
        self.transform.rotate(&self.config);
    }

    /// Render the viewport as currently displayed.
    pub fn render(&self) -> RgbaImage {
        render_crop_viewport(self.source.as_ref(), &self.transform, self.side)
    }

    /// Rasterize the displayed viewport to a JPEG data URI.
    pub fn apply(self) -> Result<String, EncodeError> {
        let uri = encode_data_uri(&self.render(), self.config.output_quality)?;
        tracing::info!(
            session = self.id(),
            zoom = self.transform.zoom,
            rotation = self.transform.rotation_deg,
            "Applied crop"
        );
        Ok(uri)
    }

    /// Discard the transform and return the untouched source.
    pub fn cancel(self) -> String {
        tracing::info!(session = self.id(), "Crop cancelled");
        self.source_uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_image, parse_data_uri};
    use image::Rgba;

    fn loaded(container_width: f64) -> CropperSession {
        let mut cropper = CropperSession::new("camera://raw", container_width, CropperConfig::default());
        let ticket = cropper.request_decode();
        let image = RgbaImage::from_fn(300, 200, |x, _| {
            Rgba(if x < 150 { [255, 0, 0, 255] } else { [0, 0, 255, 255] })
        });
        cropper.deliver_decoded(ticket, image).unwrap();
        cropper
    }

    #[test]
    fn test_viewport_side_capped() {
        let config = CropperConfig::default();
        assert_eq!(CropperSession::new("a", 1200.0, config.clone()).side(), 400);
        assert_eq!(CropperSession::new("a", 320.7, config.clone()).side(), 320);
        assert_eq!(CropperSession::new("a", f64::NAN, config).side(), 400);
    }

    #[test]
    fn test_pan_keeps_grab_point() {
        let mut cropper = loaded(400.0);
        cropper.pointer_down(Point::new(100.0, 100.0));
        cropper.pointer_move(Point::new(130.0, 90.0));
        cropper.pointer_up();
        assert_eq!(cropper.transform().offset, Vec2::new(30.0, -10.0));

        // A second pan continues from the current offset.
        cropper.pointer_down(Point::new(0.0, 0.0));
        cropper.pointer_move(Point::new(5.0, 5.0));
        assert_eq!(cropper.transform().offset, Vec2::new(35.0, -5.0));
        cropper.pointer_up();
        assert!(!cropper.is_panning());
    }

    #[test]
    fn test_move_without_press_is_ignored() {
        let mut cropper = loaded(400.0);
        cropper.pointer_move(Point::new(50.0, 50.0));
        assert_eq!(cropper.transform().offset, Vec2::ZERO);
    }

    #[test]
    fn test_zoom_pinned_at_bounds() {
        let mut cropper = loaded(400.0);
        for _ in 0..50 {
            cropper.zoom_out();
        }
        assert_eq!(cropper.transform().zoom, 0.5);
        for _ in 0..50 {
            cropper.zoom_in();
        }
        assert_eq!(cropper.transform().zoom, 3.0);
        cropper.set_zoom(-4.0);
        assert_eq!(cropper.transform().zoom, 0.5);
    }

    #[test]
    fn test_rotate_steps() {
        let mut cropper = loaded(400.0);
        cropper.rotate();
        cropper.rotate();
        assert_eq!(cropper.transform().rotation_deg, 180.0);
    }

    #[test]
    fn test_render_matches_side() {
        let cropper = loaded(250.0);
        let frame = cropper.render();
        assert_eq!(frame.dimensions(), (250, 250));
        assert_eq!(frame.get_pixel(20, 125).0, [255, 0, 0, 255]);
        assert_eq!(frame.get_pixel(230, 125).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_apply_encodes_displayed_viewport() {
        let mut cropper = loaded(200.0);
        cropper.rotate();
        let uri = cropper.apply().unwrap();
        let (mime, bytes) = parse_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(decode_image(&bytes).unwrap().dimensions(), (200, 200));
    }

    #[test]
    fn test_apply_before_decode_is_black() {
        let cropper = CropperSession::new("camera://raw", 64.0, CropperConfig::default());
        assert!(!cropper.is_loaded());
        let uri = cropper.apply().unwrap();
        let (_, bytes) = parse_data_uri(&uri).unwrap();
        let frame = decode_image(&bytes).unwrap();
        assert!(frame.get_pixel(32, 32).0[0] < 8);
    }

    #[test]
    fn test_cancel_returns_source() {
        let mut cropper = loaded(400.0);
        cropper.zoom_in();
        assert_eq!(cropper.cancel(), "camera://raw");
    }

    #[test]
    fn test_stale_decode_ignored() {
        let mut cropper = CropperSession::new("camera://raw", 100.0, CropperConfig::default());
        let old = cropper.request_decode();
        let _current = cropper.request_decode();
        assert!(cropper.deliver_decoded(old, RgbaImage::new(4, 4)).is_err());
        assert!(!cropper.is_loaded());
    }
}
