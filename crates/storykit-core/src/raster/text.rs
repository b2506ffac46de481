//! Text rendering.
//!
//! Glyph outlines come from fonts the host registers in a [`FontBook`] and
//! are rasterized with `ab_glyph`. A layer's font family list picks which
//! faces are tried first; every other registered face is a fallback. A
//! character no face covers is drawn from the 8x8 `font8x8` tables, scaled
//! to an `s x s` cell at font size `s`, and a character neither can draw
//! becomes a hollow box. Text is one line, centered on its anchor point, and
//! the line box is always `font_px` tall.
//!
//! Variation selectors and zero-width joiners take no space.

use std::fmt;

use ab_glyph::{Font as _, FontArc, GlyphId, OutlinedGlyph, ScaleFont as _};
use font8x8::{
    UnicodeFonts, BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, GREEK_FONTS, LATIN_FONTS, MISC_FONTS,
};
use image::RgbaImage;
use kurbo::{Point, Size};
use thiserror::Error;

use super::blend_pixel;
use crate::Color;

/// Bits per glyph row and rows per glyph.
const CELL: usize = 8;

/// Font size used when rasterizing glyph stickers.
const TILE_FONT_PX: f64 = 128.0;

/// Drawn for characters nothing can render.
const MISSING: [u8; 8] = [0x00, 0x7e, 0x42, 0x42, 0x42, 0x42, 0x7e, 0x00];

const BLANK: [u8; 8] = [0; 8];

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FontError {
    #[error("Font data for {family:?} could not be parsed")]
    InvalidFont { family: String },
}

#[derive(Clone)]
struct Face {
    family: String,
    font: FontArc,
}

/// Fonts available to text layers and glyph stickers, in registration order.
#[derive(Clone, Default)]
pub struct FontBook {
    faces: Vec<Face>,
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook")
            .field("families", &self.families().collect::<Vec<_>>())
            .finish()
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TrueType/OpenType font and add it under `family`.
    ///
    /// Several faces may share a family; they are tried in registration order.
    pub fn register(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), FontError> {
        let font = FontArc::try_from_vec(bytes).map_err(|_| FontError::InvalidFont {
            family: family.to_string(),
        })?;
        self.faces.push(Face {
            family: family.trim().to_string(),
            font,
        });
        tracing::debug!(family, faces = self.faces.len(), "Font registered");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.faces.iter().map(|face| face.family.as_str())
    }

    /// True if every visible character of `text` has a real glyph, from a
    /// registered face or the built-in bitmaps.
    pub fn covers(&self, text: &str) -> bool {
        text.chars()
            .filter(|ch| !is_zero_width(*ch))
            .all(|ch| ch.is_whitespace() || self.lookup("", ch).is_some() || glyph_bitmap(ch).is_some())
    }

    /// Face indices to try for `family`: named families in list order, then
    /// every face.
    fn candidates<'a>(&'a self, family: &'a str) -> impl Iterator<Item = usize> + 'a {
        family_names(family)
            .flat_map(move |name| {
                self.faces
                    .iter()
                    .enumerate()
                    .filter(move |(_, face)| face.family.eq_ignore_ascii_case(name))
                    .map(|(index, _)| index)
            })
            .chain(0..self.faces.len())
    }

    fn lookup(&self, family: &str, ch: char) -> Option<(usize, GlyphId)> {
        self.candidates(family).find_map(|index| {
            let id = self.faces[index].font.glyph_id(ch);
            (id.0 != 0).then_some((index, id))
        })
    }
}

/// Names in a CSS-style family list such as `"Inter", sans-serif`.
fn family_names(family: &str) -> impl Iterator<Item = &str> {
    family
        .split(',')
        .map(|name| name.trim().trim_matches(|c: char| c == '"' || c == '\''))
        .filter(|name| !name.is_empty())
}

/// Fill and outline for a text draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub fill: Color,
    /// Outline color and width in pixels, drawn beneath the fill.
    pub outline: Option<(Color, f64)>,
}

impl TextStyle {
    /// Fill with a dark outline whose width follows the font size.
    pub fn outlined(fill: Color, outline: Color, font_px: f64) -> Self {
        Self {
            fill,
            outline: Some((outline, (font_px / 12.0).max(1.0))),
        }
    }
}

/// 8x8 bitmap for a character. Bit 0 of each row is the leftmost pixel.
fn glyph_bitmap(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| MISC_FONTS.get(ch))
}

#[inline]
fn is_zero_width(ch: char) -> bool {
    matches!(ch, '\u{200d}' | '\u{fe00}'..='\u{fe0f}')
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Outline { face: usize, id: GlyphId },
    Cell([u8; 8]),
}

#[derive(Debug, Clone, Copy)]
struct Placed {
    /// Pen position from the start of the line.
    x: f64,
    shape: Shape,
}

struct Line {
    glyphs: Vec<Placed>,
    width: f64,
}

fn layout(fonts: &FontBook, family: &str, text: &str, font_px: f64) -> Line {
    let mut glyphs = Vec::new();
    let mut pen = 0.0;
    let mut previous: Option<(usize, GlyphId)> = None;

    for ch in text.chars().filter(|ch| !is_zero_width(*ch)) {
        let shape = match fonts.lookup(family, ch) {
            Some((face, id)) => Shape::Outline { face, id },
            None => match glyph_bitmap(ch) {
                Some(bits) => Shape::Cell(bits),
                None if ch.is_whitespace() => Shape::Cell(BLANK),
                None => Shape::Cell(MISSING),
            },
        };

        let advance = match shape {
            Shape::Outline { face, id } => {
                let scaled = fonts.faces[face].font.as_scaled(font_px as f32);
                if let Some((prev_face, prev_id)) = previous {
                    if prev_face == face {
                        pen += scaled.kern(prev_id, id) as f64;
                    }
                }
                previous = Some((face, id));
                scaled.h_advance(id) as f64
            }
            Shape::Cell(_) => {
                previous = None;
                font_px
            }
        };

        glyphs.push(Placed { x: pen, shape });
        pen += advance;
    }

    Line { glyphs, width: pen }
}

/// Pixel extent of `text` in `family` at the given font size.
pub fn measure_text(fonts: &FontBook, family: &str, text: &str, font_px: f64) -> Size {
    let line = layout(fonts, family, text, font_px);
    if line.glyphs.is_empty() {
        return Size::ZERO;
    }
    Size::new(line.width, font_px)
}

/// One positioned piece of ink.
enum Ink {
    Outline(OutlinedGlyph),
    Cell { left: f64, bits: [u8; 8] },
}

/// Coverage (0.0..=1.0) of laid-out glyphs, padded by `pad` pixels on every
/// side.
struct InkMask {
    origin_x: i64,
    origin_y: i64,
    width: usize,
    height: usize,
    ink: Vec<f32>,
}

impl InkMask {
    fn build(
        fonts: &FontBook,
        line: &Line,
        center: Point,
        font_px: f64,
        pad: usize,
    ) -> Option<Self> {
        let left = center.x - line.width / 2.0;
        let top = center.y - font_px / 2.0;

        let mut pieces = Vec::with_capacity(line.glyphs.len());
        for placed in &line.glyphs {
            match placed.shape {
                Shape::Outline { face, id } => {
                    let font = &fonts.faces[face].font;
                    let baseline = top + font.as_scaled(font_px as f32).ascent() as f64;
                    let glyph = id.with_scale_and_position(
                        font_px as f32,
                        ab_glyph::point((left + placed.x) as f32, baseline as f32),
                    );
                    // Whitespace has no outline.
                    if let Some(outlined) = font.outline_glyph(glyph) {
                        pieces.push(Ink::Outline(outlined));
                    }
                }
                Shape::Cell(bits) if bits != BLANK => pieces.push(Ink::Cell {
                    left: left + placed.x,
                    bits,
                }),
                Shape::Cell(_) => {}
            }
        }

        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for piece in &pieces {
            let (x0, y0, x1, y1) = match piece {
                Ink::Outline(outlined) => {
                    let b = outlined.px_bounds();
                    (b.min.x as f64, b.min.y as f64, b.max.x as f64, b.max.y as f64)
                }
                Ink::Cell { left, .. } => (*left, top, left + font_px, top + font_px),
            };
            min_x = min_x.min(x0);
            min_y = min_y.min(y0);
            max_x = max_x.max(x1);
            max_y = max_y.max(y1);
        }
        if pieces.is_empty() {
            return None;
        }

        let origin_x = min_x.floor() as i64 - pad as i64;
        let origin_y = min_y.floor() as i64 - pad as i64;
        let width = (max_x.ceil() - min_x.floor()) as usize + 2 * pad + 1;
        let height = (max_y.ceil() - min_y.floor()) as usize + 2 * pad + 1;
        let mut mask = Self {
            origin_x,
            origin_y,
            width,
            height,
            ink: vec![0.0; width * height],
        };

        for piece in &pieces {
            match piece {
                Ink::Outline(outlined) => mask.add_outline(outlined),
                Ink::Cell { left, bits } => mask.add_cell(*left, top, font_px, bits),
            }
        }
        Some(mask)
    }

    fn add_outline(&mut self, outlined: &OutlinedGlyph) {
        let bounds = outlined.px_bounds();
        let gx0 = bounds.min.x as i64 - self.origin_x;
        let gy0 = bounds.min.y as i64 - self.origin_y;
        let (width, height) = (self.width as i64, self.height as i64);
        let ink = &mut self.ink;
        outlined.draw(|gx, gy, coverage| {
            let mx = gx0 + gx as i64;
            let my = gy0 + gy as i64;
            if mx < 0 || my < 0 || mx >= width || my >= height {
                return;
            }
            let cell = &mut ink[(my * width + mx) as usize];
            *cell = cell.max(coverage.clamp(0.0, 1.0));
        });
    }

    /// Sample a bitmap cell at pixel centers.
    fn add_cell(&mut self, left: f64, top: f64, font_px: f64, bits: &[u8; 8]) {
        let bit = font_px / CELL as f64;
        for my in 0..self.height {
            let py = (self.origin_y + my as i64) as f64 + 0.5;
            let row = ((py - top) / bit).floor();
            if row < 0.0 || row >= CELL as f64 {
                continue;
            }
            let row = bits[row as usize];

            for mx in 0..self.width {
                let px = (self.origin_x + mx as i64) as f64 + 0.5;
                let col = ((px - left) / bit).floor();
                if col < 0.0 || col >= CELL as f64 {
                    continue;
                }
                if (row >> col as usize) & 1 == 1 {
                    self.ink[my * self.width + mx] = 1.0;
                }
            }
        }
    }

    /// Coverage grown by a disc of the given radius.
    fn dilate(&self, radius: f64) -> Vec<f32> {
        let r = radius.ceil() as i64;
        let r_sq = radius * radius;
        let mut out = vec![0.0f32; self.ink.len()];

        for y in 0..self.height {
            for x in 0..self.width {
                let coverage = self.ink[y * self.width + x];
                if coverage <= 0.0 {
                    continue;
                }
                for dy in -r..=r {
                    for dx in -r..=r {
                        if (dx * dx + dy * dy) as f64 > r_sq {
                            continue;
                        }
                        let nx = x as i64 + dx;
                        let ny = y as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64
                        {
                            continue;
                        }
                        let cell = &mut out[ny as usize * self.width + nx as usize];
                        *cell = cell.max(coverage);
                    }
                }
            }
        }
        out
    }

    /// Blend `color` weighted by `mask` coverage.
    fn paint(&self, canvas: &mut RgbaImage, mask: &[f32], color: Color) {
        let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
        for my in 0..self.height {
            let y = self.origin_y + my as i64;
            if y < 0 || y >= ch {
                continue;
            }
            for mx in 0..self.width {
                let x = self.origin_x + mx as i64;
                let coverage = mask[my * self.width + mx];
                if x < 0 || x >= cw || coverage <= 0.0 {
                    continue;
                }
                blend_pixel(canvas.get_pixel_mut(x as u32, y as u32), color.to_array(), coverage);
            }
        }
    }
}

/// Draw one line of text centered on `center`.
///
/// The outline, if any, is painted first so the fill always sits on top of it.
pub fn draw_text(
    canvas: &mut RgbaImage,
    fonts: &FontBook,
    family: &str,
    text: &str,
    center: Point,
    font_px: f64,
    style: TextStyle,
) {
    if font_px <= 0.0 || !font_px.is_finite() {
        return;
    }
    let line = layout(fonts, family, text, font_px);

    let outline_pad = style
        .outline
        .map(|(_, width)| width.max(0.0).ceil() as usize)
        .unwrap_or(0);
    let Some(mask) = InkMask::build(fonts, &line, center, font_px, outline_pad) else {
        return;
    };

    if let Some((color, width)) = style.outline {
        if width > 0.0 {
            let outline = mask.dilate(width);
            mask.paint(canvas, &outline, color);
        }
    }
    mask.paint(canvas, &mask.ink, style.fill);
}

/// Rasterize a glyph sticker onto a transparent square tile, outlined in
/// black for contrast.
///
/// Any registered face may supply the glyph. Returns `None` only when the
/// glyph string has no visible characters.
pub fn render_glyph_tile(fonts: &FontBook, glyph: &str, fill: Color) -> Option<RgbaImage> {
    let line = layout(fonts, "", glyph, TILE_FONT_PX);
    if line.glyphs.is_empty() {
        return None;
    }

    let style = TextStyle::outlined(fill, Color::BLACK, TILE_FONT_PX);
    let pad = style.outline.map(|(_, width)| width.ceil()).unwrap_or(0.0);
    let side = (line.width.max(TILE_FONT_PX) + 2.0 * pad).ceil() as u32;

    let mut tile = RgbaImage::new(side, side);
    let center = Point::new(side as f64 / 2.0, side as f64 / 2.0);
    draw_text(&mut tile, fonts, "", glyph, center, TILE_FONT_PX, style);
    Some(tile)
}
