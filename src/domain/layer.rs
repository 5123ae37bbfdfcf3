//! Normalized transform state for a single entity
//!
//! A [`Layer`] stores position relative to the canvas, a multiplicative
//! scale, a rotation in degrees and a horizontal flip flag. The scale range
//! and initial scale depend on the kind of entity, so they travel with the
//! layer as [`LayerLimits`].
//!
//! [`TextLayer`] adds the text content and its [`Font`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by checked layer assignments
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerError {
    #[error("Scale {value} outside allowed range [{min}, {max}]")]
    ScaleOutOfRange { value: f32, min: f32, max: f32 },

    #[error("Rotation {value} outside allowed range [0, 360)")]
    RotationOutOfRange { value: f32 },
}

/// Scale policy for one kind of entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerLimits {
    pub min_scale: f32,
    pub max_scale: f32,
    pub initial_scale: f32,
}

impl LayerLimits {
    /// Limits for image entities
    pub const IMAGE: LayerLimits = LayerLimits {
        min_scale: 0.06,
        max_scale: 4.0,
        initial_scale: 0.4,
    };

    /// Limits for text entities
    ///
    /// Text keeps its matrix scale near 1 so that the font size, not the
    /// matrix, controls apparent size. Small fonts cannot be scaled up 100+
    /// times.
    pub const TEXT: LayerLimits = LayerLimits {
        min_scale: 0.2,
        max_scale: 2.0,
        initial_scale: 0.8,
    };

    /// Clamps a scale value into `[min_scale, max_scale]`
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    pub fn contains(&self, scale: f32) -> bool {
        (self.min_scale..=self.max_scale).contains(&scale)
    }
}

impl Default for LayerLimits {
    fn default() -> Self {
        Self::IMAGE
    }
}

/// Position, scale, rotation and flip of one entity
///
/// Invariants (held by every mutating method):
/// - `limits.min_scale <= scale <= limits.max_scale`
/// - `0 <= rotation_in_degrees < 360`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Top-left X coordinate, relative to canvas width
    pub x: f32,
    /// Top-left Y coordinate, relative to canvas height
    pub y: f32,
    scale: f32,
    rotation_in_degrees: f32,
    /// Flipped horizontally (by X coordinate)
    pub flipped: bool,
    limits: LayerLimits,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    /// Creates a layer with image limits and the default transform
    pub fn new() -> Self {
        Self::with_limits(LayerLimits::IMAGE)
    }

    /// Creates a layer with the given limits and the default transform
    pub fn with_limits(limits: LayerLimits) -> Self {
        let mut layer = Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation_in_degrees: 0.0,
            flipped: false,
            limits,
        };
        layer.reset();
        layer
    }

    /// Restores the default transform: origin, unit scale, no rotation or flip
    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.scale = 1.0;
        self.rotation_in_degrees = 0.0;
        self.flipped = false;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation_in_degrees(&self) -> f32 {
        self.rotation_in_degrees
    }

    pub fn limits(&self) -> LayerLimits {
        self.limits
    }

    pub fn min_scale(&self) -> f32 {
        self.limits.min_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.limits.max_scale
    }

    /// Scale applied when an entity is first positioned on the canvas
    pub fn initial_scale(&self) -> f32 {
        self.limits.initial_scale
    }

    /// Sets the scale to [`Layer::initial_scale`], clamped to the limits
    pub fn apply_initial_scale(&mut self) {
        self.scale = self.limits.clamp(self.limits.initial_scale);
    }

    /// Assigns the scale directly
    ///
    /// Unlike [`Layer::post_scale`], an out-of-range value is rejected
    /// rather than clamped.
    pub fn set_scale(&mut self, value: f32) -> Result<(), LayerError> {
        if !self.limits.contains(value) {
            return Err(LayerError::ScaleOutOfRange {
                value,
                min: self.limits.min_scale,
                max: self.limits.max_scale,
            });
        }
        self.scale = value;
        Ok(())
    }

    /// Assigns the rotation directly; must lie in `[0, 360)`
    pub fn set_rotation_in_degrees(&mut self, value: f32) -> Result<(), LayerError> {
        if !(0.0..360.0).contains(&value) {
            return Err(LayerError::RotationOutOfRange { value });
        }
        self.rotation_in_degrees = value;
        Ok(())
    }

    /// Adds a scale difference, clamping the result to the layer limits
    ///
    /// # Example
    /// ```rust
    /// use sticker_canvas::domain::layer::Layer;
    ///
    /// let mut layer = Layer::new();
    /// layer.post_scale(10.0);
    /// assert_eq!(layer.scale(), layer.max_scale());
    /// ```
    pub fn post_scale(&mut self, scale_diff: f32) {
        let value = self.scale + scale_diff;
        if value.is_finite() {
            self.scale = self.limits.clamp(value);
        }
    }

    /// Adds a rotation difference, wrapping into `[0, 360)`
    ///
    /// # Example
    /// ```rust
    /// use sticker_canvas::domain::layer::Layer;
    ///
    /// let mut layer = Layer::new();
    /// layer.post_rotate(5.0);
    /// layer.post_rotate(-10.0);
    /// assert_eq!(layer.rotation_in_degrees(), 355.0);
    /// ```
    pub fn post_rotate(&mut self, rotation_diff: f32) {
        if !rotation_diff.is_finite() {
            return;
        }
        let mut value = (self.rotation_in_degrees + rotation_diff).rem_euclid(360.0);
        // rem_euclid of a tiny negative value rounds up to exactly 360.0
        if value >= 360.0 {
            value = 0.0;
        }
        self.rotation_in_degrees = value;
    }

    /// Brings a layer read from outside back within its invariants
    pub(crate) fn normalize(&mut self) {
        self.scale = if self.scale.is_finite() {
            self.limits.clamp(self.scale)
        } else {
            self.limits.clamp(1.0)
        };
        let rotation = self.rotation_in_degrees;
        self.rotation_in_degrees = 0.0;
        self.post_rotate(rotation);
    }

    /// Moves the layer by a canvas-relative offset
    pub fn post_translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Toggles the horizontal flip
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }
}

/// Font description for a text layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    /// ARGB color, e.g. `0xFF000000` for opaque black
    pub color: u32,
    /// Name of the typeface, resolved through the font provider
    pub typeface: Option<String>,
    size: f32,
}

impl Font {
    /// Smallest allowed size, relative to canvas width
    pub const MIN_SIZE: f32 = 0.01;
    /// Default step for size adjustments
    pub const SIZE_STEP: f32 = 0.008;
    pub const INITIAL_SIZE: f32 = 0.2;
    pub const INITIAL_COLOR: u32 = 0xFF00_0000;

    /// Creates a font, clamping the size to [`Font::MIN_SIZE`]
    pub fn new(color: u32, typeface: Option<String>, size: f32) -> Self {
        Self {
            color,
            typeface,
            size: clamp_font_size(size),
        }
    }

    /// Size relative to canvas width
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = clamp_font_size(size);
    }

    pub fn increase_size(&mut self, diff: f32) {
        self.set_size(self.size + diff);
    }

    pub fn decrease_size(&mut self, diff: f32) {
        self.set_size(self.size - diff);
    }

    /// Size in pixels for a canvas of the given width
    pub fn size_px(&self, canvas_width: f32) -> f32 {
        self.size * canvas_width
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new(Self::INITIAL_COLOR, None, Self::INITIAL_SIZE)
    }
}

fn clamp_font_size(size: f32) -> f32 {
    if size.is_finite() {
        size.max(Font::MIN_SIZE)
    } else {
        Font::MIN_SIZE
    }
}

/// Layer of a text entity: transform plus text content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLayer {
    pub layer: Layer,
    pub text: String,
    pub font: Font,
}

impl Default for TextLayer {
    fn default() -> Self {
        Self::new(String::new(), Font::default())
    }
}

impl TextLayer {
    /// Raster height floor, relative to canvas height
    pub const MIN_BITMAP_HEIGHT: f32 = 0.13;

    pub fn new(text: impl Into<String>, font: Font) -> Self {
        Self {
            layer: Layer::with_limits(LayerLimits::TEXT),
            text: text.into(),
            font,
        }
    }

    /// Resets transform, text and font
    pub fn reset(&mut self) {
        self.layer.reset();
        self.text.clear();
        self.font = Font::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_layer_has_default_transform() {
        let layer = Layer::new();
        assert_eq!(layer.x, 0.0);
        assert_eq!(layer.y, 0.0);
        assert_eq!(layer.scale(), 1.0);
        assert_eq!(layer.rotation_in_degrees(), 0.0);
        assert!(!layer.flipped);
        assert_eq!(layer.initial_scale(), 0.4);
    }

    #[test]
    fn text_layer_overrides_limits() {
        let text = TextLayer::default();
        assert_eq!(text.layer.min_scale(), 0.2);
        assert_eq!(text.layer.max_scale(), 2.0);
        assert_eq!(text.layer.initial_scale(), 0.8);
    }

    #[test]
    fn post_scale_stays_within_limits() {
        let mut layer = Layer::new();
        let diffs = [3.5, 1.0, -10.0, 0.01, -0.5, 7.0, -3.0, -0.97];
        for diff in diffs {
            layer.post_scale(diff);
            assert!(layer.scale() >= layer.min_scale(), "scale {}", layer.scale());
            assert!(layer.scale() <= layer.max_scale(), "scale {}", layer.scale());
        }

        layer.post_scale(-100.0);
        assert_eq!(layer.scale(), 0.06);
        layer.post_scale(100.0);
        assert_eq!(layer.scale(), 4.0);
    }

    #[test]
    fn post_scale_text_limits() {
        let mut text = TextLayer::default();
        text.layer.post_scale(5.0);
        assert_eq!(text.layer.scale(), 2.0);
        text.layer.post_scale(-5.0);
        assert_eq!(text.layer.scale(), 0.2);
    }

    #[test]
    fn post_scale_ignores_non_finite() {
        let mut layer = Layer::new();
        layer.post_scale(f32::NAN);
        assert_eq!(layer.scale(), 1.0);
    }

    #[test]
    fn post_rotate_wraps_both_directions() {
        let mut layer = Layer::new();
        layer.post_rotate(5.0);
        layer.post_rotate(-10.0);
        assert_eq!(layer.rotation_in_degrees(), 355.0);

        layer.post_rotate(10.0);
        assert_eq!(layer.rotation_in_degrees(), 5.0);

        layer.post_rotate(720.0);
        assert_eq!(layer.rotation_in_degrees(), 5.0);

        layer.post_rotate(-725.0);
        assert_eq!(layer.rotation_in_degrees(), 0.0);
    }

    #[test]
    fn post_rotate_invariant_holds_for_any_sequence() {
        let mut layer = Layer::new();
        let diffs = [-0.000_01, 359.999_9, -1e-7, 1e-7, -361.0, 45.5, -90.25, 1000.0];
        for diff in diffs {
            layer.post_rotate(diff);
            let r = layer.rotation_in_degrees();
            assert!((0.0..360.0).contains(&r), "rotation {r} after {diff}");
        }
    }

    #[test]
    fn checked_setters_reject_out_of_range() {
        let mut layer = Layer::new();
        assert!(layer.set_scale(2.0).is_ok());
        assert!(matches!(
            layer.set_scale(5.0),
            Err(LayerError::ScaleOutOfRange { .. })
        ));
        assert_eq!(layer.scale(), 2.0);

        assert!(layer.set_rotation_in_degrees(359.0).is_ok());
        assert_eq!(
            layer.set_rotation_in_degrees(360.0),
            Err(LayerError::RotationOutOfRange { value: 360.0 })
        );
        assert!(layer.set_rotation_in_degrees(-1.0).is_err());
    }

    #[test]
    fn normalize_repairs_deserialized_layer() {
        let json = r#"{"x":0.1,"y":0.2,"scale":9.0,"rotation_in_degrees":-30.0,"flipped":true,
            "limits":{"min_scale":0.06,"max_scale":4.0,"initial_scale":0.4}}"#;
        let mut layer: Layer = serde_json::from_str(json).unwrap();
        layer.normalize();
        assert_eq!(layer.scale(), 4.0);
        assert_eq!(layer.rotation_in_degrees(), 330.0);
        assert!(layer.flipped);
    }

    #[test]
    fn flip_toggles() {
        let mut layer = Layer::new();
        layer.flip();
        assert!(layer.flipped);
        layer.flip();
        assert!(!layer.flipped);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut layer = Layer::new();
        layer.post_translate(0.3, 0.4);
        layer.post_rotate(30.0);
        layer.flip();
        layer.reset();
        assert_eq!(layer, Layer::new());
    }

    #[test]
    fn font_size_is_clamped_to_minimum() {
        let mut font = Font::new(0xFFFF_0000, None, 0.001);
        assert_eq!(font.size(), Font::MIN_SIZE);

        font.increase_size(0.05);
        assert!((font.size() - 0.06).abs() < 1e-6);

        font.decrease_size(1.0);
        assert_eq!(font.size(), Font::MIN_SIZE);
    }

    #[test]
    fn text_layer_reset_clears_content() {
        let mut text = TextLayer::new("hello", Font::new(0xFF00_FF00, Some("Arial".into()), 0.3));
        text.layer.post_translate(0.5, 0.5);
        text.reset();
        assert!(text.text.is_empty());
        assert_eq!(text.font, Font::default());
        assert_eq!(text.layer.x, 0.0);
        assert_eq!(text.layer.max_scale(), 2.0);
    }
}
