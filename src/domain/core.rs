//! Core geometry types and operations
//!
//! This module defines the pure geometric building blocks used by the
//! transform engine and hit-testing. Everything here works in canvas pixels
//! and has no knowledge of rasters or touch input.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::Transform;

/// Errors raised when canvas dimensions are rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("Invalid canvas dimensions: {width}x{height} (both must be at least 1)")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Point in canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Creates a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Maps this point through an affine transform
    pub fn transformed(self, ts: &Transform) -> Self {
        Self {
            x: self.x * ts.sx + self.y * ts.kx + ts.tx,
            y: self.x * ts.ky + self.y * ts.sy + ts.ty,
        }
    }
}

/// Immutable snapshot of a canvas size in pixels
///
/// Both dimensions are guaranteed to be at least 1, so normalizing by them
/// never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCanvasSize", into = "RawCanvasSize")]
pub struct CanvasSize {
    width: u32,
    height: u32,
}

impl CanvasSize {
    /// Creates a canvas size, rejecting zero dimensions
    ///
    /// # Example
    /// ```rust
    /// use sticker_canvas::domain::core::CanvasSize;
    ///
    /// let size = CanvasSize::new(1080, 1920).unwrap();
    /// assert_eq!(size.width(), 1080);
    /// assert!(CanvasSize::new(0, 10).is_err());
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width < 1 || height < 1 {
            return Err(CanvasError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width as a float, for normalized coordinate math
    pub fn w(&self) -> f32 {
        self.width as f32
    }

    /// Height as a float, for normalized coordinate math
    pub fn h(&self) -> f32 {
        self.height as f32
    }

    /// Center point of the canvas
    pub fn center(&self) -> Point {
        Point::new(self.w() * 0.5, self.h() * 0.5)
    }
}

#[derive(Serialize, Deserialize)]
struct RawCanvasSize {
    width: u32,
    height: u32,
}

impl TryFrom<RawCanvasSize> for CanvasSize {
    type Error = CanvasError;

    fn try_from(raw: RawCanvasSize) -> Result<Self, Self::Error> {
        CanvasSize::new(raw.width, raw.height)
    }
}

impl From<CanvasSize> for RawCanvasSize {
    fn from(size: CanvasSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

/// Closed quadrilateral: four corners clockwise from top-left, with the
/// first corner repeated to close the loop
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quad {
    pub points: [Point; 5],
}

impl Quad {
    /// Builds the local-space quad for content of the given pixel size
    pub fn from_size(width: f32, height: f32) -> Self {
        let a = Point::new(0.0, 0.0);
        Self {
            points: [
                a,
                Point::new(width, 0.0),
                Point::new(width, height),
                Point::new(0.0, height),
                a,
            ],
        }
    }

    /// Maps every vertex through the transform
    pub fn transformed(&self, ts: &Transform) -> Self {
        let mut points = self.points;
        for p in points.iter_mut() {
            *p = p.transformed(ts);
        }
        Self { points }
    }

    /// Returns true if the point lies inside the quad
    ///
    /// The quad is split along its A-C diagonal into triangles (A, B, C)
    /// and (A, D, C); a point is inside if it is inside either one. Works
    /// for any convex quad, whatever its rotation or mirroring.
    pub fn contains(&self, p: Point) -> bool {
        let [a, b, c, d, _] = self.points;
        point_in_triangle(p, a, b, c) || point_in_triangle(p, a, d, c)
    }

    /// Returns the four edges as point pairs, in drawing order
    pub fn edges(&self) -> [(Point, Point); 4] {
        let p = &self.points;
        [(p[0], p[1]), (p[1], p[2]), (p[2], p[3]), (p[3], p[4])]
    }
}

/// Point-in-triangle test using the sign of the cross products
///
/// Points on an edge count as inside. Winding order of the triangle does
/// not matter.
pub fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let d1 = cross_sign(p, a, b);
    let d2 = cross_sign(p, b, c);
    let d3 = cross_sign(p, c, a);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}

fn cross_sign(p: Point, a: Point, b: Point) -> f32 {
    (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
}

/// Nine matrix coefficients in row-major order
/// `[scaleX, skewX, transX, skewY, scaleY, transY, persp0, persp1, persp2]`
pub fn matrix_values(ts: &Transform) -> [f32; 9] {
    [ts.sx, ts.kx, ts.tx, ts.ky, ts.sy, ts.ty, 0.0, 0.0, 1.0]
}

/// Inverse of [`matrix_values`], ignoring the perspective row
pub fn transform_from_values(values: &[f32; 9]) -> Transform {
    Transform::from_row(values[0], values[3], values[1], values[4], values[2], values[5])
}
