//! Image drawing with inverse-mapped sampling.
//!
//! For each destination pixel we map its center back into source space and
//! sample with bilinear interpolation:
//! ```text
//! local = inverse(transform) * (dst_x + 0.5, dst_y + 0.5)
//! src   = (local + half_extent) / extent * src_size
//! ```

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point};

use super::blend_pixel;

/// Sample `image` at continuous coordinates with bilinear interpolation.
///
/// Interpolation happens on premultiplied values so transparent neighbors do
/// not darken edges. Coordinates outside the image clamp to the border.
pub fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return [0, 0, 0, 0];
    }

    // Shift so integer coordinates hit pixel centers.
    let fx = (x - 0.5).clamp(0.0, (w - 1) as f64);
    let fy = (y - 0.5).clamp(0.0, (h - 1) as f64);

    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let weights = [
        ((1.0 - tx) * (1.0 - ty), image.get_pixel(x0, y0)),
        (tx * (1.0 - ty), image.get_pixel(x1, y0)),
        ((1.0 - tx) * ty, image.get_pixel(x0, y1)),
        (tx * ty, image.get_pixel(x1, y1)),
    ];

    let mut premul = [0.0f64; 3];
    let mut alpha = 0.0f64;
    for (weight, pixel) in weights {
        let a = pixel.0[3] as f64 / 255.0;
        for i in 0..3 {
            premul[i] += weight * pixel.0[i] as f64 * a;
        }
        alpha += weight * a;
    }

    if alpha <= 0.0 {
        return [0, 0, 0, 0];
    }

    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = (premul[i] / alpha).clamp(0.0, 255.0).round() as u8;
    }
    out[3] = (alpha * 255.0).clamp(0.0, 255.0).round() as u8;
    out
}

/// Draw `src` into the rectangle `[-w/2, w/2] x [-h/2, h/2]` of the local
/// space described by `transform`, compositing source-over onto `canvas`.
///
/// `transform` maps local coordinates to canvas pixels, so a caller builds it
/// the way a 2D canvas context is driven: translate, then rotate, then scale.
pub fn draw_image_transformed(
    canvas: &mut RgbaImage,
    src: &RgbaImage,
    transform: Affine,
    width: f64,
    height: f64,
) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    if cw == 0 || ch == 0 || sw == 0 || sh == 0 || width <= 0.0 || height <= 0.0 {
        return;
    }
    if transform.determinant().abs() < f64::EPSILON {
        return;
    }

    let half_w = width / 2.0;
    let half_h = height / 2.0;

    // Bounding box of the transformed rectangle, clipped to the canvas.
    let corners = [
        Point::new(-half_w, -half_h),
        Point::new(half_w, -half_h),
        Point::new(half_w, half_h),
        Point::new(-half_w, half_h),
    ]
    .map(|p| transform * p);
    let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let x_start = min_x.floor().max(0.0) as u32;
    let y_start = min_y.floor().max(0.0) as u32;
    let x_end = (max_x.ceil().min(cw as f64)).max(0.0) as u32;
    let y_end = (max_y.ceil().min(ch as f64)).max(0.0) as u32;

    let inverse = transform.inverse();
    let sx_scale = sw as f64 / width;
    let sy_scale = sh as f64 / height;

    for y in y_start..y_end {
        for x in x_start..x_end {
            let local = inverse * Point::new(x as f64 + 0.5, y as f64 + 0.5);
            if local.x < -half_w || local.x >= half_w || local.y < -half_h || local.y >= half_h {
                continue;
            }

            let src_x = (local.x + half_w) * sx_scale;
            let src_y = (local.y + half_h) * sy_scale;
            let pixel = sample_bilinear(src, src_x, src_y);
            blend_pixel(canvas.get_pixel_mut(x, y), pixel, 1.0);
        }
    }
}

/// Draw `src` stretched to cover `canvas` exactly, compositing source-over.
pub fn draw_image_stretched(canvas: &mut RgbaImage, src: &RgbaImage) {
    let (cw, ch) = canvas.dimensions();
    if cw == 0 || ch == 0 || src.width() == 0 || src.height() == 0 {
        return;
    }

    let scaled;
    let layer = if src.dimensions() == (cw, ch) {
        src
    } else {
        scaled = image::imageops::resize(src, cw, ch, FilterType::Triangle);
        &scaled
    };

    for (dst, src) in canvas.pixels_mut().zip(layer.pixels()) {
        let Rgba(src) = *src;
        blend_pixel(dst, src, 1.0);
    }
}
