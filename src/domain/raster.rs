//! Rasterizer boundary
//!
//! Entities never decode images, lay out text or touch a drawing surface
//! themselves. They go through the small capability traits defined here;
//! the `ui` module provides the tiny-skia / ab_glyph implementations and
//! tests provide stubs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{Pixmap, Transform};

use crate::domain::core::Point;
use crate::domain::layer::Font;

/// Raster and collaborator errors
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to create {width}x{height} pixmap")]
    PixmapCreationFailed { width: u32, height: u32 },

    #[error("Failed to load image {source_name}: {reason}")]
    ImageLoadFailed { source_name: String, reason: String },

    #[error("Unknown font '{name}'")]
    UnknownFont { name: String },

    #[error("Font '{name}' could not be parsed")]
    InvalidFont { name: String },

    #[error("Failed to read font file {path}: {source}")]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode raster: {0}")]
    EncodingFailed(String),
}

/// Where an image entity's pixels come from
///
/// Persisted with the entity so that the raster can be reloaded on restore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageSource {
    /// Image file on disk
    File { path: PathBuf },
    /// Named resource resolved by the loader
    Resource { name: String },
}

impl ImageSource {
    /// Human-readable description, used in errors and logs
    pub fn describe(&self) -> String {
        match self {
            ImageSource::File { path } => path.display().to_string(),
            ImageSource::Resource { name } => format!("resource:{name}"),
        }
    }
}

/// Paint override used while drawing an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawPaint {
    /// Opacity in `[0, 1]`
    pub opacity: f32,
    pub anti_alias: bool,
}

impl DrawPaint {
    pub fn with_opacity(opacity: f32) -> Self {
        Self {
            opacity: opacity.clamp(0.0, 1.0),
            anti_alias: true,
        }
    }

    /// Opacity expressed as an 8-bit alpha
    pub fn alpha8(&self) -> u8 {
        (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Default for DrawPaint {
    fn default() -> Self {
        Self::with_opacity(1.0)
    }
}

/// Drawing surface consumed by entities and the composition
pub trait Canvas {
    /// Draws a pre-rendered image through an affine transform
    fn draw_image(&mut self, image: &Pixmap, transform: Transform, paint: Option<&DrawPaint>);

    /// Strokes line segments given in canvas coordinates
    fn draw_lines(&mut self, segments: &[(Point, Point)], stroke_width: f32, color: u32);
}

/// Text rendered by a [`TextRasterizer`]
#[derive(Debug)]
pub struct RenderedText {
    /// `bounds_width` wide and at least one pixel tall
    pub pixmap: Pixmap,
    /// Height actually covered by the laid out text, may be 0 for empty text
    pub height: u32,
}

/// Measures and renders wrapped, centered text
pub trait TextRasterizer {
    fn measure_and_render(
        &self,
        text: &str,
        font: &Font,
        bounds_width: u32,
    ) -> Result<RenderedText, RasterError>;
}

/// Decodes an image from its provenance
pub trait ImageLoader {
    fn load(&self, source: &ImageSource) -> Result<Pixmap, RasterError>;
}

/// Allocates a transparent pixmap, mapping allocation failure to an error
pub fn new_pixmap(width: u32, height: u32) -> Result<Pixmap, RasterError> {
    Pixmap::new(width, height).ok_or(RasterError::PixmapCreationFailed { width, height })
}

/// Splits an ARGB color into tiny-skia's RGBA color
pub fn color_from_argb(argb: u32) -> tiny_skia::Color {
    let a = (argb >> 24) as u8;
    let r = (argb >> 16) as u8;
    let g = (argb >> 8) as u8;
    let b = argb as u8;
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

/// Replaces the alpha channel of an ARGB color
pub fn with_alpha(argb: u32, alpha: u8) -> u32 {
    (argb & 0x00FF_FFFF) | ((alpha as u32) << 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pixmap_rejects_zero_size() {
        assert!(new_pixmap(4, 4).is_ok());
        assert!(matches!(
            new_pixmap(0, 4),
            Err(RasterError::PixmapCreationFailed { width: 0, height: 4 })
        ));
    }

    #[test]
    fn argb_conversion() {
        let color = color_from_argb(0x80FF_0000);
        assert_eq!(color.red(), 1.0);
        assert_eq!(color.green(), 0.0);
        assert!((color.alpha() - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(with_alpha(0xFF12_3456, 0x26), 0x2612_3456);
    }

    #[test]
    fn draw_paint_alpha() {
        assert_eq!(DrawPaint::with_opacity(0.15).alpha8(), 38);
        assert_eq!(DrawPaint::with_opacity(2.0).alpha8(), 255);
    }

    #[test]
    fn image_source_description() {
        let file = ImageSource::File { path: "a/b.png".into() };
        assert_eq!(file.describe(), "a/b.png");
        let res = ImageSource::Resource { name: "star".into() };
        assert_eq!(res.describe(), "resource:star");
    }
}
