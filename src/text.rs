//! Text overlay rendering
//!
//! TrueType fonts are rasterized with `fontdue`. When the configured font file
//! is missing or unreadable the built-in 8x8 bitmap font is used instead; that
//! substitution is a warning, never an error.

use crate::color::parse_color;
use crate::composite::blend_over;
use crate::error::{ErrorKind, Warning};
use crate::models::TextSpec;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use fontdue::{Font, FontSettings};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Line height multiplier when the font carries no line metrics
const FALLBACK_LINE_GAP: f32 = 1.2;

/// Glyph source for a text overlay.
pub enum Typeface {
    TrueType(Box<Font>),
    /// font8x8 glyphs scaled up to the requested size
    Builtin,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Typeface::TrueType(_) => f.write_str("TrueType"),
            Typeface::Builtin => f.write_str("Builtin"),
        }
    }
}

/// Load the font at `path`, degrading to [`Typeface::Builtin`].
pub fn load_typeface(path: &Path, size: f32) -> (Typeface, Option<Warning>) {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            let warning = Warning::new(
                ErrorKind::FontUnavailable,
                format!("font '{}' unavailable ({}), using built-in font", path.display(), e),
            );
            return (Typeface::Builtin, Some(warning));
        }
    };

    let settings = FontSettings { scale: size, ..FontSettings::default() };
    match Font::from_bytes(bytes, settings) {
        Ok(font) => (Typeface::TrueType(Box::new(font)), None),
        Err(e) => {
            let warning = Warning::new(
                ErrorKind::FontUnavailable,
                format!("font '{}' could not be parsed ({}), using built-in font", path.display(), e),
            );
            (Typeface::Builtin, Some(warning))
        }
    }
}

/// A fully prepared text overlay, shared by every frame of one call.
#[derive(Debug)]
pub struct TextOverlay {
    pub text: String,
    pub origin: (i32, i32),
    pub size: f32,
    pub color: Rgba<u8>,
    pub typeface: Typeface,
}

impl TextOverlay {
    /// Build the overlay for `spec` with the caller's `content`.
    ///
    /// Returns `None` when there is nothing to draw (empty content) or the
    /// overlay cannot be drawn at all (bad color); the latter is reported as
    /// a warning.
    pub fn prepare(spec: &TextSpec, content: &str, font_path: &Path) -> (Option<Self>, Vec<Warning>) {
        let mut warnings = Vec::new();
        if content.is_empty() {
            return (None, warnings);
        }

        let color = match parse_color(&spec.color_hex) {
            Ok(color) => color,
            Err(e) => {
                warnings.push(Warning::new(
                    ErrorKind::TextDrawFailed,
                    format!("text color '{}' is invalid: {}; text omitted", spec.color_hex, e),
                ));
                return (None, warnings);
            }
        };

        let size = spec.font_size as f32;
        let (typeface, font_warning) = load_typeface(font_path, size);
        warnings.extend(font_warning);

        let overlay = TextOverlay {
            text: spec.render_text(content),
            origin: spec.position(),
            size,
            color,
            typeface,
        };
        (Some(overlay), warnings)
    }

    /// Draw onto `canvas`. Glyphs falling outside the canvas are clipped.
    pub fn draw(&self, canvas: &mut RgbaImage) {
        match &self.typeface {
            Typeface::TrueType(font) => self.draw_truetype(canvas, font),
            Typeface::Builtin => self.draw_builtin(canvas),
        }
    }

    fn draw_truetype(&self, canvas: &mut RgbaImage, font: &Font) {
        let (ascent, line_height) = match font.horizontal_line_metrics(self.size) {
            Some(m) => (m.ascent, m.new_line_size),
            None => (self.size, self.size * FALLBACK_LINE_GAP),
        };

        let (origin_x, origin_y) = self.origin;
        for (line_no, line) in self.text.lines().enumerate() {
            let baseline = origin_y as f32 + ascent + line_no as f32 * line_height;
            let mut cursor = origin_x as f32;

            for ch in line.chars() {
                let (metrics, coverage) = font.rasterize(ch, self.size);
                let glyph_x = cursor.round() as i32 + metrics.xmin;
                let glyph_y = baseline.round() as i32 - (metrics.height as i32 + metrics.ymin);

                for gy in 0..metrics.height {
                    for gx in 0..metrics.width {
                        let value = coverage[gy * metrics.width + gx];
                        if value == 0 {
                            continue;
                        }
                        self.plot(canvas, glyph_x + gx as i32, glyph_y + gy as i32, value);
                    }
                }
                cursor += metrics.advance_width;
            }
        }
    }

    fn draw_builtin(&self, canvas: &mut RgbaImage) {
        let scale = ((self.size / 8.0).round() as i32).max(1);
        let cell = 8 * scale;
        let (origin_x, origin_y) = self.origin;

        for (line_no, line) in self.text.lines().enumerate() {
            let top = origin_y + line_no as i32 * cell;
            for (i, ch) in line.chars().enumerate() {
                let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
                    continue;
                };
                let left = origin_x + i as i32 * cell;

                for (row, bits) in glyph.iter().enumerate() {
                    for col in 0..8 {
                        if (bits >> col) & 1 == 0 {
                            continue;
                        }
                        let base_x = left + col * scale;
                        let base_y = top + row as i32 * scale;
                        for dy in 0..scale {
                            for dx in 0..scale {
                                self.plot(canvas, base_x + dx, base_y + dy, 255);
                            }
                        }
                    }
                }
            }
        }
    }

    fn plot(&self, canvas: &mut RgbaImage, x: i32, y: i32, coverage: u8) {
        if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
            return;
        }
        let alpha = (self.color[3] as u32 * coverage as u32 + 127) / 255;
        let src = Rgba([self.color[0], self.color[1], self.color[2], alpha as u8]);
        blend_over(canvas.get_pixel_mut(x as u32, y as u32), src);
    }
}
