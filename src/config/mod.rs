//! Configuration for sticker-canvas
//!
//! Gesture tuning and composition defaults. Every struct validates itself
//! and can be read from JSON, with missing fields falling back to defaults.

pub mod settings;

pub use settings::{CompositionConfig, ConfigError, GestureConfig, ScreenMetrics, Settings};
