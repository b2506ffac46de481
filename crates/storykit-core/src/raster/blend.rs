//! Source-over compositing of straight-alpha pixels.

use image::Rgba;

/// Composite `src` over `dst` with an extra coverage factor (0.0..=1.0).
///
/// A fully opaque source at full coverage replaces the destination exactly.
#[inline]
pub fn blend_pixel(dst: &mut Rgba<u8>, src: [u8; 4], coverage: f32) {
    let sa = (src[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    if sa >= 1.0 {
        dst.0 = [src[0], src[1], src[2], 255];
        return;
    }

    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.0 = [0, 0, 0, 0];
        return;
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = src[i] as f32;
        let dc = dst.0[i] as f32;
        out[i] = ((sc * sa + dc * da * (1.0 - sa)) / out_a)
            .clamp(0.0, 255.0)
            .round() as u8;
    }
    out[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
    dst.0 = out;
}
