//! Rasterizer boundary implementations
//!
//! tiny-skia drawing, ab_glyph text rendering and PNG loading behind the
//! domain's `Canvas`, `TextRasterizer` and `ImageLoader` traits.

pub mod image;
pub mod renderer;
pub mod text;

pub use image::PngImageLoader;
pub use renderer::SkiaCanvas;
pub use text::{FontProvider, GlyphTextRenderer};
