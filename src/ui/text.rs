//! Text rasterization with ab_glyph
//!
//! [`FontProvider`] is an explicit, caller-owned font cache keyed by
//! typeface name. Font files are registered by path and parsed on first
//! use. [`GlyphTextRenderer`] borrows a provider and implements the
//! domain's [`TextRasterizer`]: it wraps text to the bounds width, centers
//! each line and rasterizes glyph coverage into a pixmap.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use ab_glyph::{point, Font as _, FontArc, GlyphId, PxScale, PxScaleFont, ScaleFont};
use tiny_skia::{Mask, Paint, Rect, Transform};
use tracing::debug;

use crate::domain::layer::Font;
use crate::domain::raster::{color_from_argb, new_pixmap, RasterError, RenderedText, TextRasterizer};

/// Memoized typeface lookup
#[derive(Debug, Default)]
pub struct FontProvider {
    sources: HashMap<String, PathBuf>,
    cache: RefCell<HashMap<String, FontArc>>,
    default_name: Option<String>,
}

impl FontProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a font file; it is read and parsed on first lookup
    ///
    /// The first registered font becomes the default.
    pub fn register_file(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let name = name.into();
        self.cache.borrow_mut().remove(&name);
        self.default_name.get_or_insert_with(|| name.clone());
        self.sources.insert(name, path.into());
    }

    /// Registers an in-memory font, parsing it immediately
    pub fn register_bytes(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), RasterError> {
        let name = name.into();
        let font = FontArc::try_from_vec(bytes).map_err(|_| RasterError::InvalidFont { name: name.clone() })?;
        self.sources.remove(&name);
        self.default_name.get_or_insert_with(|| name.clone());
        self.cache.borrow_mut().insert(name, font);
        Ok(())
    }

    /// Chooses the font used when a text layer names no typeface
    pub fn set_default(&mut self, name: &str) -> Result<(), RasterError> {
        if !self.contains(name) {
            return Err(RasterError::UnknownFont { name: name.to_string() });
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name) || self.cache.borrow().contains_key(name)
    }

    /// Registered typeface names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sources
            .keys()
            .chain(self.cache.borrow().keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Resolves a typeface, falling back to the default when `name` is None
    pub fn font(&self, name: Option<&str>) -> Result<FontArc, RasterError> {
        let name = match name.or(self.default_name.as_deref()) {
            Some(name) => name,
            None => {
                return Err(RasterError::UnknownFont {
                    name: "<default>".to_string(),
                })
            }
        };

        if let Some(font) = self.cache.borrow().get(name) {
            return Ok(font.clone());
        }

        let path = self
            .sources
            .get(name)
            .ok_or_else(|| RasterError::UnknownFont { name: name.to_string() })?;
        let bytes = std::fs::read(path).map_err(|source| RasterError::FontIo {
            path: path.clone(),
            source,
        })?;
        let font = FontArc::try_from_vec(bytes).map_err(|_| RasterError::InvalidFont { name: name.to_string() })?;

        debug!(font = name, path = %path.display(), "loaded font");
        self.cache.borrow_mut().insert(name.to_string(), font.clone());
        Ok(font)
    }
}

/// Text rasterizer drawing with fonts from a [`FontProvider`]
#[derive(Debug, Clone, Copy)]
pub struct GlyphTextRenderer<'a> {
    fonts: &'a FontProvider,
}

impl<'a> GlyphTextRenderer<'a> {
    pub fn new(fonts: &'a FontProvider) -> Self {
        Self { fonts }
    }
}

impl TextRasterizer for GlyphTextRenderer<'_> {
    fn measure_and_render(
        &self,
        text: &str,
        font: &Font,
        bounds_width: u32,
    ) -> Result<RenderedText, RasterError> {
        let face = self.fonts.font(font.typeface.as_deref())?;
        let px = font.size_px(bounds_width as f32).max(1.0);
        let scaled = face.as_scaled(PxScale::from(px));

        let lines = wrap_lines(text, bounds_width as f32, |s| line_width(&scaled, s));
        let line_height = scaled.height() + scaled.line_gap();
        let height = (line_height * lines.len() as f32).ceil() as u32;

        let mut pixmap = new_pixmap(bounds_width, height.max(1))?;
        if lines.is_empty() {
            return Ok(RenderedText { pixmap, height: 0 });
        }

        let mut mask = Mask::new(bounds_width, height.max(1))
            .ok_or(RasterError::PixmapCreationFailed { width: bounds_width, height })?;
        let mask_width = mask.width() as i64;
        let mask_height = mask.height() as i64;
        let coverage = mask.data_mut();

        for (index, line) in lines.iter().enumerate() {
            let offset_x = (bounds_width as f32 - line_width(&scaled, line)) / 2.0;
            let baseline = index as f32 * line_height + scaled.ascent();

            let mut caret = offset_x;
            let mut prev: Option<GlyphId> = None;
            for ch in line.chars() {
                let id = scaled.glyph_id(ch);
                if let Some(prev) = prev {
                    caret += scaled.kern(prev, id);
                }
                let glyph = id.with_scale_and_position(px, point(caret, baseline));
                caret += scaled.h_advance(id);
                prev = Some(id);

                let Some(outlined) = face.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, cov| {
                    let x = bounds.min.x as i64 + gx as i64;
                    let y = bounds.min.y as i64 + gy as i64;
                    if x < 0 || y < 0 || x >= mask_width || y >= mask_height {
                        return;
                    }
                    let slot = &mut coverage[(y * mask_width + x) as usize];
                    let value = (cov.clamp(0.0, 1.0) * 255.0).round() as u8;
                    *slot = (*slot).max(value);
                });
            }
        }

        let mut paint = Paint::default();
        paint.set_color(color_from_argb(font.color));
        paint.anti_alias = false;
        if let Some(rect) = Rect::from_xywh(0.0, 0.0, bounds_width as f32, height.max(1) as f32) {
            pixmap.fill_rect(rect, &paint, Transform::identity(), Some(&mask));
        }

        Ok(RenderedText { pixmap, height })
    }
}

fn line_width(scaled: &PxScaleFont<&FontArc>, line: &str) -> f32 {
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Greedy word wrap
///
/// Paragraphs split on `\n`; words wider than `max_width` are broken
/// between characters. Empty text yields no lines, an empty paragraph
/// yields an empty line.
pub fn wrap_lines(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if measure(&candidate) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if measure(word) <= max_width {
                line = word.to_string();
                continue;
            }

            for ch in word.chars() {
                let mut next = line.clone();
                next.push(ch);
                if !line.is_empty() && measure(&next) > max_width {
                    lines.push(std::mem::take(&mut line));
                    line.push(ch);
                } else {
                    line = next;
                }
            }
        }
        lines.push(line);
    }
    lines
}
