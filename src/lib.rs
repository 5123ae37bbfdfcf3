//! Touch-driven sticker canvas
//!
//! Places images and text blocks on a 2D canvas, manipulates them with
//! multi-touch gestures and persists the resulting scene as JSON.
//!
//! - [`input`] turns raw touch events into move, rotate, shove, scale and
//!   tap signals
//! - [`domain`] holds layers, entities and their transform engine
//! - [`app`] owns the scene and routes gestures into it
//! - [`ui`] renders with tiny-skia and ab_glyph
//! - [`config`] holds gesture and composition settings

pub mod app;
pub mod config;
pub mod domain;
pub mod input;
pub mod ui;
