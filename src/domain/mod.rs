//! Domain logic and core data structures
//!
//! Geometry, layers, entities and their persisted form. Independent of any
//! concrete rasterizer: drawing, text layout and image decoding go through
//! the traits in [`raster`].

pub mod core;
pub mod entity;
pub mod layer;
pub mod raster;
pub mod record;
