//! Drawing surface backed by a tiny-skia pixmap
//!
//! Implements the domain [`Canvas`] trait: entity rasters are composited
//! through their affine matrix and selection borders are stroked as paths.

use std::path::Path;

use tiny_skia::{
    BlendMode, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::domain::core::Point;
use crate::domain::raster::{color_from_argb, new_pixmap, Canvas, DrawPaint, RasterError};

/// Opaque white, used as thumbnail background
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Pixmap-backed canvas
#[derive(Debug, Clone)]
pub struct SkiaCanvas {
    pixmap: Pixmap,
}

impl SkiaCanvas {
    /// Creates a transparent canvas
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Ok(Self {
            pixmap: new_pixmap(width, height)?,
        })
    }

    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self { pixmap }
    }

    /// Fills the whole canvas with an ARGB color
    pub fn clear(&mut self, argb: u32) {
        self.pixmap.fill(color_from_argb(argb));
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RasterError::EncodingFailed(e.to_string()))
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RasterError> {
        self.pixmap
            .save_png(path)
            .map_err(|e| RasterError::EncodingFailed(format!("{}: {e}", path.display())))
    }
}

impl Canvas for SkiaCanvas {
    fn draw_image(&mut self, image: &Pixmap, transform: Transform, paint: Option<&DrawPaint>) {
        let paint = paint.copied().unwrap_or_default();
        let pixmap_paint = PixmapPaint {
            opacity: paint.opacity,
            blend_mode: BlendMode::SourceOver,
            quality: if paint.anti_alias {
                FilterQuality::Bilinear
            } else {
                FilterQuality::Nearest
            },
        };
        self.pixmap
            .draw_pixmap(0, 0, image.as_ref(), &pixmap_paint, transform, None);
    }

    fn draw_lines(&mut self, segments: &[(Point, Point)], stroke_width: f32, color: u32) {
        let mut builder = PathBuilder::new();
        for (from, to) in segments {
            builder.move_to(from.x, from.y);
            builder.line_to(to.x, to.y);
        }

        if let Some(path) = builder.finish() {
            let mut paint = Paint::default();
            paint.set_color(color_from_argb(color));
            paint.anti_alias = true;

            let stroke = Stroke {
                width: stroke_width,
                ..Stroke::default()
            };

            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}
