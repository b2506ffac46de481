//! Named tone/color filters.
//!
//! The catalog is fixed. Each entry carries a CSS-like filter expression
//! (`"sepia(50%) contrast(150%)"`) that parses into an ordered chain of
//! [`FilterOp`]s, applied in a single pass over the base image only.
//!
//! ## Color math
//! Grayscale, sepia, invert, brightness and contrast follow the CSS Filter
//! Effects definitions on normalized channels. Channels are clamped to
//! 0.0..=1.0 after every function in the chain. Blur is a gaussian with the
//! given pixel standard deviation.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from filter lookup and parsing.
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    /// The name is not in the fixed catalog.
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// A filter expression could not be parsed.
    #[error("Invalid filter expression: {0}")]
    InvalidExpression(String),
}

/// A named entry of the filter catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub name: &'static str,
    pub expression: &'static str,
}

/// The fixed filter catalog, in display order.
pub const CATALOG: [FilterSpec; 8] = [
    FilterSpec::new("Normal", "none"),
    FilterSpec::new("Grayscale", "grayscale(100%)"),
    FilterSpec::new("Sepia", "sepia(100%)"),
    FilterSpec::new("Invert", "invert(100%)"),
    FilterSpec::new("Blur", "blur(5px)"),
    FilterSpec::new("Brightness", "brightness(150%)"),
    FilterSpec::new("Contrast", "contrast(200%)"),
    FilterSpec::new("Vintage", "sepia(50%) contrast(150%)"),
];

/// The identity filter.
pub const NORMAL: FilterSpec = CATALOG[0];

impl FilterSpec {
    const fn new(name: &'static str, expression: &'static str) -> Self {
        Self { name, expression }
    }

    /// Parse this entry's expression into its operation chain.
    pub fn ops(&self) -> Result<Vec<FilterOp>, FilterError> {
        parse_expression(self.expression)
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        NORMAL
    }
}

/// Look up a catalog entry.
///
/// Accepts the display name (case-insensitive) or the entry's expression
/// verbatim.
pub fn resolve(name: &str) -> Result<FilterSpec, FilterError> {
    let name = name.trim();
    CATALOG
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name) || spec.expression == name)
        .copied()
        .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))
}

/// One function of a filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Amount 0.0..=1.0.
    Grayscale(f32),
    /// Amount 0.0..=1.0.
    Sepia(f32),
    /// Amount 0.0..=1.0.
    Invert(f32),
    /// Linear multiplier, 1.0 = unchanged.
    Brightness(f32),
    /// Linear multiplier around mid-gray, 1.0 = unchanged.
    Contrast(f32),
    /// Gaussian standard deviation in pixels.
    Blur(f32),
}

/// Parse a CSS-like filter expression.
///
/// `"none"` and the empty string parse to an empty chain.
pub fn parse_expression(expression: &str) -> Result<Vec<FilterOp>, FilterError> {
    let expression = expression.trim();
    if expression.is_empty() || expression == "none" {
        return Ok(Vec::new());
    }

    let invalid = || FilterError::InvalidExpression(expression.to_string());
    let mut ops = Vec::new();
    let mut rest = expression;

    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(invalid)?;
        let close = rest.find(')').ok_or_else(invalid)?;
        if close < open {
            return Err(invalid());
        }

        let name = rest[..open].trim();
        let arg = rest[open + 1..close].trim();
        ops.push(parse_function(name, arg).ok_or_else(invalid)?);

        rest = rest[close + 1..].trim_start();
    }

    Ok(ops)
}

fn parse_function(name: &str, arg: &str) -> Option<FilterOp> {
    let op = match name {
        "grayscale" => FilterOp::Grayscale(parse_amount(arg)?.min(1.0)),
        "sepia" => FilterOp::Sepia(parse_amount(arg)?.min(1.0)),
        "invert" => FilterOp::Invert(parse_amount(arg)?.min(1.0)),
        "brightness" => FilterOp::Brightness(parse_amount(arg)?),
        "contrast" => FilterOp::Contrast(parse_amount(arg)?),
        "blur" => FilterOp::Blur(parse_length(arg)?),
        _ => return None,
    };
    Some(op)
}

/// `50%` -> 0.5, `0.5` -> 0.5. Negative amounts are rejected.
fn parse_amount(arg: &str) -> Option<f32> {
    let value = match arg.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
        None => arg.parse::<f32>().ok()?,
    };
    (value >= 0.0 && value.is_finite()).then_some(value)
}

/// `5px` -> 5.0, `0` -> 0.0.
fn parse_length(arg: &str) -> Option<f32> {
    let value = arg.strip_suffix("px").unwrap_or(arg).trim().parse::<f32>().ok()?;
    (value >= 0.0 && value.is_finite()).then_some(value)
}

/// Apply a catalog filter to an image in place.
///
/// Color functions leave alpha untouched; blur filters all four channels.
pub fn apply_filter(image: &mut RgbaImage, spec: &FilterSpec) -> Result<(), FilterError> {
    let ops = spec.ops()?;
    apply_ops(image, &ops);
    Ok(())
}

/// Apply an operation chain to an image in place.
pub fn apply_ops(image: &mut RgbaImage, ops: &[FilterOp]) {
    for op in ops {
        match *op {
            FilterOp::Blur(sigma) => {
                if sigma > 0.0 {
                    *image = image::imageops::blur(image, sigma);
                }
            }
            color_op => {
                for pixel in image.pixels_mut() {
                    let [r, g, b, _] = &mut pixel.0;
                    let rgb = [*r as f32 / 255.0, *g as f32 / 255.0, *b as f32 / 255.0];
                    let [nr, ng, nb] = apply_color_op(rgb, color_op);
                    *r = to_u8(nr);
                    *g = to_u8(ng);
                    *b = to_u8(nb);
                }
            }
        }
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
fn apply_color_op(rgb: [f32; 3], op: FilterOp) -> [f32; 3] {
    match op {
        FilterOp::Grayscale(amount) => apply_matrix(rgb, &grayscale_matrix(amount)),
        FilterOp::Sepia(amount) => apply_matrix(rgb, &sepia_matrix(amount)),
        FilterOp::Invert(amount) => rgb.map(|c| amount * (1.0 - c) + (1.0 - amount) * c),
        FilterOp::Brightness(amount) => rgb.map(|c| c * amount),
        FilterOp::Contrast(amount) => rgb.map(|c| (c - 0.5) * amount + 0.5),
        FilterOp::Blur(_) => rgb,
    }
}

#[inline]
fn apply_matrix(rgb: [f32; 3], m: &[[f32; 3]; 3]) -> [f32; 3] {
    let [r, g, b] = rgb;
    [
        (m[0][0] * r + m[0][1] * g + m[0][2] * b).clamp(0.0, 1.0),
        (m[1][0] * r + m[1][1] * g + m[1][2] * b).clamp(0.0, 1.0),
        (m[2][0] * r + m[2][1] * g + m[2][2] * b).clamp(0.0, 1.0),
    ]
}

fn grayscale_matrix(amount: f32) -> [[f32; 3]; 3] {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

fn sepia_matrix(amount: f32) -> [[f32; 3]; 3] {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn color_op_strategy() -> impl Strategy<Value = FilterOp> {
        prop_oneof![
            (0.0f32..=1.0).prop_map(FilterOp::Grayscale),
            (0.0f32..=1.0).prop_map(FilterOp::Sepia),
            (0.0f32..=1.0).prop_map(FilterOp::Invert),
            (0.0f32..=4.0).prop_map(FilterOp::Brightness),
            (0.0f32..=4.0).prop_map(FilterOp::Contrast),
        ]
    }

    proptest! {
        /// Property: zero-strength grayscale/sepia/invert are identities.
        #[test]
        fn prop_zero_amount_identity(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            for op in [FilterOp::Grayscale(0.0), FilterOp::Sepia(0.0), FilterOp::Invert(0.0)] {
                let mut img = RgbaImage::from_pixel(1, 1, Rgba([r, g, b, 255]));
                apply_ops(&mut img, &[op]);
                let out = img.get_pixel(0, 0).0;
                prop_assert!((out[0] as i32 - r as i32).abs() <= 1);
                prop_assert!((out[1] as i32 - g as i32).abs() <= 1);
                prop_assert!((out[2] as i32 - b as i32).abs() <= 1);
            }
        }

        /// Property: applying a chain is deterministic.
        #[test]
        fn prop_deterministic(
            ops in prop::collection::vec(color_op_strategy(), 0..4),
            r in any::<u8>(), g in any::<u8>(), b in any::<u8>(),
        ) {
            let mut a = RgbaImage::from_pixel(2, 2, Rgba([r, g, b, 255]));
            let mut c = a.clone();
            apply_ops(&mut a, &ops);
            apply_ops(&mut c, &ops);
            prop_assert_eq!(a, c);
        }
    }
}
