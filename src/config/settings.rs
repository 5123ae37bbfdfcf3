use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Screen dimensions used for sloppy-gesture detection
///
/// Supplied by the host; may change on orientation changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMetrics {
    pub width: f32,
    pub height: f32,
}

impl ScreenMetrics {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Tuning values shared by the gesture recognizers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Margin from each screen edge inside which a touch counts as sloppy
    pub edge_slop: f32,
    /// Minimum current/previous pressure ratio for a frame to be accepted
    pub pressure_threshold: f32,
    /// Shove deltas at or below this many pixels are ignored
    pub shove_dead_zone: f32,
    /// Max pointer travel for a touch to still count as a tap
    pub tap_slop: f32,
    /// Max distance between the two taps of a double tap
    pub double_tap_slop: f32,
    pub double_tap_timeout_ms: u64,
    pub long_press_timeout_ms: u64,
}

impl GestureConfig {
    pub const DEFAULT_EDGE_SLOP: f32 = 12.0;
    pub const DEFAULT_PRESSURE_THRESHOLD: f32 = 0.67;
    pub const DEFAULT_SHOVE_DEAD_ZONE: f32 = 0.5;
    pub const DEFAULT_TAP_SLOP: f32 = 8.0;
    pub const DEFAULT_DOUBLE_TAP_SLOP: f32 = 100.0;
    pub const DEFAULT_DOUBLE_TAP_TIMEOUT_MS: u64 = 300;
    pub const DEFAULT_LONG_PRESS_TIMEOUT_MS: u64 = 500;

    /// Checks every value for sanity
    ///
    /// # Returns
    /// The first offending field as a [`ConfigError`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("edge_slop", self.edge_slop)?;
        non_negative("shove_dead_zone", self.shove_dead_zone)?;
        non_negative("tap_slop", self.tap_slop)?;
        non_negative("double_tap_slop", self.double_tap_slop)?;

        if !(self.pressure_threshold.is_finite()
            && self.pressure_threshold > 0.0
            && self.pressure_threshold <= 1.0)
        {
            return Err(ConfigError::OutOfRange {
                field: "pressure_threshold",
                value: self.pressure_threshold,
                min: 0.0,
                max: 1.0,
            });
        }

        if self.double_tap_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "double_tap_timeout_ms",
            });
        }
        if self.long_press_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "long_press_timeout_ms",
            });
        }

        Ok(())
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            edge_slop: Self::DEFAULT_EDGE_SLOP,
            pressure_threshold: Self::DEFAULT_PRESSURE_THRESHOLD,
            shove_dead_zone: Self::DEFAULT_SHOVE_DEAD_ZONE,
            tap_slop: Self::DEFAULT_TAP_SLOP,
            double_tap_slop: Self::DEFAULT_DOUBLE_TAP_SLOP,
            double_tap_timeout_ms: Self::DEFAULT_DOUBLE_TAP_TIMEOUT_MS,
            long_press_timeout_ms: Self::DEFAULT_LONG_PRESS_TIMEOUT_MS,
        }
    }
}

/// Look of the composition: border paint and the selected-entity overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    pub border_stroke_width: f32,
    /// ARGB color of the selection border
    pub border_color: u32,
    /// Opacity of the selected entity redrawn on top of the scene
    pub selected_layer_alpha: f32,
}

impl CompositionConfig {
    pub const DEFAULT_BORDER_STROKE_WIDTH: f32 = 4.0;
    pub const DEFAULT_BORDER_COLOR: u32 = 0xFF33_B5E5;
    pub const DEFAULT_SELECTED_LAYER_ALPHA: f32 = 0.15;
    pub const MAX_BORDER_STROKE_WIDTH: f32 = 64.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.border_stroke_width.is_finite()
            && (0.0..=Self::MAX_BORDER_STROKE_WIDTH).contains(&self.border_stroke_width))
        {
            return Err(ConfigError::OutOfRange {
                field: "border_stroke_width",
                value: self.border_stroke_width,
                min: 0.0,
                max: Self::MAX_BORDER_STROKE_WIDTH,
            });
        }

        if !(self.selected_layer_alpha.is_finite()
            && (0.0..=1.0).contains(&self.selected_layer_alpha))
        {
            return Err(ConfigError::OutOfRange {
                field: "selected_layer_alpha",
                value: self.selected_layer_alpha,
                min: 0.0,
                max: 1.0,
            });
        }

        Ok(())
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            border_stroke_width: Self::DEFAULT_BORDER_STROKE_WIDTH,
            border_color: Self::DEFAULT_BORDER_COLOR,
            selected_layer_alpha: Self::DEFAULT_SELECTED_LAYER_ALPHA,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration {section} must be a JSON object")]
    NotAnObject { section: &'static str },
}

/// Full set of tunables, loadable from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gesture: GestureConfig,
    pub composition: CompositionConfig,
}

impl Settings {
    /// Parses and validates settings; missing fields take their defaults
    ///
    /// The document and each section must be JSON objects.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let Some(sections) = value.as_object() else {
            return Err(ConfigError::NotAnObject { section: "root" });
        };
        for section in ["gesture", "composition"] {
            if sections.get(section).is_some_and(|v| !v.is_object()) {
                return Err(ConfigError::NotAnObject { section });
            }
        }

        let settings: Settings = serde_json::from_value(value)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gesture.validate()?;
        self.composition.validate()
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GestureConfig::default().validate().is_ok());
        assert!(CompositionConfig::default().validate().is_ok());
    }

    #[test]
    fn gesture_defaults() {
        let config = GestureConfig::default();
        assert_eq!(config.edge_slop, 12.0);
        assert_eq!(config.pressure_threshold, 0.67);
        assert_eq!(config.shove_dead_zone, 0.5);
        assert_eq!(config.long_press_timeout_ms, 500);
    }

    #[test]
    fn rejects_bad_gesture_values() {
        let config = GestureConfig {
            edge_slop: -1.0,
            ..GestureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { field: "edge_slop", .. })
        ));

        let config = GestureConfig {
            pressure_threshold: 1.5,
            ..GestureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "pressure_threshold", .. })
        ));

        let config = GestureConfig {
            long_press_timeout_ms: 0,
            ..GestureConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDuration { .. })));
    }

    #[test]
    fn rejects_bad_composition_values() {
        let config = CompositionConfig {
            selected_layer_alpha: f32::NAN,
            ..CompositionConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CompositionConfig {
            border_stroke_width: 100.0,
            ..CompositionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: GestureConfig = serde_json::from_str(r#"{"edge_slop": 20.0}"#).unwrap();
        assert_eq!(config.edge_slop, 20.0);
        assert_eq!(config.tap_slop, GestureConfig::DEFAULT_TAP_SLOP);
    }

    #[test]
    fn settings_from_json_validates() {
        let settings =
            Settings::from_json(r#"{"composition": {"border_stroke_width": 2.0}}"#).unwrap();
        assert_eq!(settings.composition.border_stroke_width, 2.0);
        assert_eq!(settings.gesture, GestureConfig::default());

        let bad = Settings::from_json(r#"{"gesture": {"tap_slop": -3.0}}"#);
        assert!(matches!(bad, Err(ConfigError::Negative { field: "tap_slop", .. })));
        assert!(matches!(Settings::from_json("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn settings_from_json_requires_objects() {
        assert!(matches!(
            Settings::from_json("[]"),
            Err(ConfigError::NotAnObject { section: "root" })
        ));
        assert!(matches!(
            Settings::from_json("42"),
            Err(ConfigError::NotAnObject { section: "root" })
        ));
        assert!(matches!(
            Settings::from_json(r#"{"gesture": []}"#),
            Err(ConfigError::NotAnObject { section: "gesture" })
        ));
        assert!(matches!(
            Settings::from_json(r#"{"composition": [1.0, 0.5]}"#),
            Err(ConfigError::NotAnObject { section: "composition" })
        ));
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn settings_load_reports_missing_file() {
        let result = Settings::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
