//! Touch controller
//!
//! Host-facing entry point for touch input. Each event is fanned out to the
//! scale, rotate, move and tap recognizers in that order; their callbacks
//! land in the [`Composition`], which applies them to the selected entity.

use tracing::trace;

use crate::app::composition::Composition;
use crate::config::{GestureConfig, ScreenMetrics};
use crate::domain::core::Point;
use crate::input::{
    GestureDetector, MoveDetector, MoveListener, RotateDetector, RotateListener, ScaleDetector,
    ScaleListener, TapDetector, TapListener, TouchEvent,
};

/// Owns one recognizer per supported gesture
#[derive(Debug, Clone)]
pub struct MotionController {
    scale: ScaleDetector,
    rotate: RotateDetector,
    movement: MoveDetector,
    tap: TapDetector,
}

impl MotionController {
    /// Creates the recognizers
    ///
    /// # Arguments
    /// * `config` - Gesture tuning, expected to be validated
    /// * `screen` - Screen size used for edge-slop checks
    pub fn new(config: &GestureConfig, screen: ScreenMetrics) -> Self {
        Self {
            scale: ScaleDetector::new(config, screen),
            rotate: RotateDetector::new(config, screen),
            movement: MoveDetector::new(config),
            tap: TapDetector::new(config),
        }
    }

    /// Updates the screen size after a resize or rotation
    pub fn set_screen_metrics(&mut self, screen: ScreenMetrics) {
        self.scale.set_screen_metrics(screen);
        self.rotate.set_screen_metrics(screen);
    }

    /// Feeds one touch event to every recognizer
    ///
    /// # Returns
    /// Always true: the event is consumed
    pub fn on_touch_event(&mut self, event: &TouchEvent, composition: &mut Composition) -> bool {
        trace!(action = ?event.action, pointers = event.pointer_count(), "touch event");
        self.scale.on_touch_event(event, composition);
        self.rotate.on_touch_event(event, composition);
        self.movement.on_touch_event(event, composition);
        self.tap.on_touch_event(event, composition);
        true
    }
}

impl ScaleListener for Composition {
    fn on_scale(&mut self, detector: &ScaleDetector) -> bool {
        self.handle_scale(detector.scale_factor());
        true
    }
}

impl RotateListener for Composition {
    fn on_rotate(&mut self, detector: &RotateDetector) -> bool {
        self.handle_rotate(detector.rotation_degrees_delta());
        true
    }
}

impl MoveListener for Composition {
    fn on_move(&mut self, detector: &MoveDetector) -> bool {
        self.handle_translate(detector.focus_delta());
        true
    }
}

impl TapListener for Composition {
    fn on_single_tap_up(&mut self, point: Point) -> bool {
        self.update_selection_on_tap(point);
        true
    }

    fn on_double_tap(&mut self, _point: Point) -> bool {
        self.handle_double_tap();
        true
    }

    fn on_long_press(&mut self, point: Point) {
        self.update_on_long_press(point);
    }
}
